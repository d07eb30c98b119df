//! Responder configuration.
//!
//! Configuration can be built in code or deserialized from YAML:
//!
//! ```yaml
//! explorer:
//!   enabled: true
//! ```

use displaydoc::Display;
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not deserialize configuration: {0}
    DeserializeConfigError(#[from] serde_yaml::Error),
}

/// The configuration of a responder.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// The GraphiQL explorer served to browsers.
    pub explorer: Explorer,
}

#[buildstructor::buildstructor]
impl Configuration {
    #[builder(visibility = "pub")]
    fn new(explorer: Option<Explorer>) -> Self {
        Self {
            explorer: explorer.unwrap_or_default(),
        }
    }

    /// Deserialize a configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        let configuration = serde_yaml::from_str::<Configuration>(yaml)?;
        tracing::debug!(explorer = configuration.explorer.enabled, "configuration loaded");
        Ok(configuration)
    }

    /// The JSON schema of the YAML configuration.
    pub fn json_schema() -> RootSchema {
        schemars::schema_for!(Configuration)
    }
}

/// Explorer options.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct Explorer {
    /// Serve GraphiQL to requests that accept `text/html`.
    /// disabled by default
    pub enabled: bool,
}

#[buildstructor::buildstructor]
impl Explorer {
    #[builder(visibility = "pub")]
    fn new(enabled: Option<bool>) -> Self {
        Self {
            enabled: enabled.unwrap_or_default(),
        }
    }

    /// An enabled explorer.
    pub fn enabled() -> Self {
        Self::builder().enabled(true).build()
    }
}

impl Default for Explorer {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_is_disabled_by_default() {
        assert!(!Configuration::default().explorer.enabled);
        assert_eq!(Configuration::from_yaml("{}").unwrap(), Configuration::default());
    }

    #[test]
    fn parses_yaml() {
        let configuration = Configuration::from_yaml(
            r#"
explorer:
  enabled: true
"#,
        )
        .unwrap();
        assert_eq!(
            configuration,
            Configuration::builder().explorer(Explorer::enabled()).build()
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let error = Configuration::from_yaml(
            r#"
explorer:
  enabled: true
  path: /graphiql
"#,
        )
        .unwrap_err();
        assert!(error.to_string().contains("unknown field `path`"));

        assert!(Configuration::from_yaml("landing_page: true").is_err());
    }

    #[test]
    fn schema_describes_the_explorer() {
        let schema = serde_json::to_value(Configuration::json_schema()).unwrap();
        assert!(
            schema.to_string().contains("Serve GraphiQL"),
            "{schema}"
        );
    }
}
