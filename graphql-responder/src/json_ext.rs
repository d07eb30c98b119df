//! Host side JSON values.
//!
//! These are the structured values the HTTP side works with: decoded request
//! bodies, the structured view of the query string and serialized responses.

use serde_json_bytes::ByteString;
use serde_json_bytes::Map;
pub use serde_json_bytes::Value;

/// A JSON object.
pub type Object = Map<ByteString, Value>;

/// Extension trait for [`serde_json_bytes::Value`].
pub trait ValueExt {
    /// Get a field of an object value, `None` for any other kind of value.
    fn get_field(&self, key: &str) -> Option<&Value>;

    /// Interpret the value as a boolean flag.
    ///
    /// Booleans are taken as is, the strings `"true"` and `"false"` and the
    /// numbers `1` and `0` are accepted as well.
    fn as_flag(&self) -> Option<bool>;
}

impl ValueExt for Value {
    fn get_field(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|object| object.get(key))
    }

    fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) => parse_flag(text.as_str()),
            Value::Number(number) => match number.as_u64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Parse the textual form of a boolean, as sent in query strings.
pub(crate) fn parse_flag(text: &str) -> Option<bool> {
    text.parse::<bool>().ok()
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;

    #[test]
    fn get_field_only_looks_into_objects() {
        let value = json!({ "query": "{ hello }" });
        assert_eq!(value.get_field("query"), Some(&json!("{ hello }")));
        assert_eq!(value.get_field("missing"), None);
        assert_eq!(json!(["query"]).get_field("query"), None);
    }

    #[test]
    fn flags() {
        assert_eq!(json!(true).as_flag(), Some(true));
        assert_eq!(json!("false").as_flag(), Some(false));
        assert_eq!(json!(1).as_flag(), Some(true));
        assert_eq!(json!(0).as_flag(), Some(false));
        assert_eq!(json!(2).as_flag(), None);
        assert_eq!(json!("yes please").as_flag(), None);
        assert_eq!(json!(null).as_flag(), None);
    }
}
