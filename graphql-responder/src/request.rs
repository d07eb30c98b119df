use http::request::Parts;

use crate::convert;
use crate::error::ResponderError;
use crate::graphql;
use crate::json_ext::Value;
use crate::json_ext::ValueExt;
use crate::json_ext::parse_flag;
use crate::services::DecodedContent;

/// The GraphQL parameters of one HTTP request.
///
/// Built once per request from the query string and the decoded body, then
/// only read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestParameters {
    query: Option<String>,
    variables: Option<graphql::Object>,
    operation_name: Option<String>,
    raw: Option<bool>,
}

#[buildstructor::buildstructor]
impl RequestParameters {
    #[builder(visibility = "pub")]
    fn new(
        query: Option<String>,
        variables: Option<graphql::Object>,
        operation_name: Option<String>,
        raw: Option<bool>,
    ) -> Self {
        Self {
            query: query.filter(|query| !query.trim().is_empty()),
            variables,
            operation_name,
            raw,
        }
    }

    /// The operation text, never empty.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The variable bindings, already converted for the engine.
    pub fn variables(&self) -> Option<&graphql::Object> {
        self.variables.as_ref()
    }

    /// The name of the operation to run.
    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    /// The raw override flag, when the client sent one.
    pub fn raw(&self) -> Option<bool> {
        self.raw
    }

    /// Extract the parameters of a request.
    ///
    /// The query string takes precedence over the body, field by field.
    /// Variables come from the first channel that has them: the `variables`
    /// query parameter as JSON text, then the bracket notation view of the
    /// query string, then the body. They are never merged.
    pub fn extract(parts: &Parts, content: &DecodedContent) -> Result<Self, ResponderError> {
        let items = QueryItems::parse(parts.uri.query().unwrap_or_default());

        let mut query = items.query.filter(|query| !query.trim().is_empty());
        let mut variables = items
            .variables
            .as_deref()
            .map(variables_from_json)
            .transpose()?
            .flatten();
        let mut operation_name = items.operation_name;
        let mut raw = items.raw.as_deref().and_then(parse_flag);

        if variables.is_none() {
            variables = content
                .query
                .as_ref()
                .and_then(|structured| structured.get_field("variables"))
                .and_then(Value::as_object)
                .map(convert::variables_to_engine);
        }

        if let Some(body) = &content.body {
            if query.is_none() {
                query = body
                    .get_field("query")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            if variables.is_none() {
                variables = match body.get_field("variables") {
                    Some(Value::Object(object)) => Some(convert::variables_to_engine(object)),
                    Some(Value::String(text)) => variables_from_json(text.as_str())?,
                    _ => None,
                };
            }
            if operation_name.is_none() {
                operation_name = body
                    .get_field("operationName")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            if raw.is_none() {
                raw = body.get_field("raw").and_then(ValueExt::as_flag);
            }
        }

        Ok(Self::new(query, variables, operation_name, raw))
    }
}

/// The recognized items of a query string, last occurrence wins.
#[derive(Default)]
struct QueryItems {
    query: Option<String>,
    variables: Option<String>,
    operation_name: Option<String>,
    raw: Option<String>,
}

impl QueryItems {
    fn parse(query_string: &str) -> Self {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(query_string).unwrap_or_default();
        let mut items = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "query" => items.query = Some(value),
                "variables" => items.variables = Some(value),
                "operationName" => items.operation_name = Some(value),
                "raw" => items.raw = Some(value),
                _ => {}
            }
        }
        items
    }
}

fn variables_from_json(text: &str) -> Result<Option<graphql::Object>, ResponderError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|error| ResponderError::InvalidVariables(error.to_string()))?;
    match value {
        Value::Object(object) => Ok(Some(convert::variables_to_engine(&object))),
        Value::Null => Ok(None),
        _ => Err(ResponderError::InvalidVariables(
            "expected a JSON object".to_string(),
        )),
    }
}
