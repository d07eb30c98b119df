//! Conversion between host JSON values and engine values.
//!
//! Both directions are total. The mapping is exact for every kind except
//! unsigned integers above `i64::MAX`: the engine has no unsigned integer, so
//! those are widened to [`graphql::Value::Double`], keeping their magnitude
//! but not necessarily every digit. Non-finite doubles have no JSON form and
//! come back to the host as `null`.

use serde_json_bytes::ByteString;

use crate::graphql;
use crate::json_ext::Object;
use crate::json_ext::Value;

/// Convert a host value into an engine value.
pub fn host_to_engine(value: &Value) -> graphql::Value {
    match value {
        Value::Null => graphql::Value::Null,
        Value::Bool(boolean) => graphql::Value::Bool(*boolean),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                graphql::Value::Int(int)
            } else if let Some(uint) = number.as_u64() {
                graphql::Value::Double(uint as f64)
            } else if let Some(double) = number.as_f64() {
                graphql::Value::Double(double)
            } else {
                graphql::Value::Null
            }
        }
        Value::String(string) => graphql::Value::String(string.as_str().to_string()),
        Value::Array(array) => graphql::Value::Array(array.iter().map(host_to_engine).collect()),
        Value::Object(object) => graphql::Value::Object(variables_to_engine(object)),
    }
}

/// Convert an engine value into a host value.
pub fn engine_to_host(value: graphql::Value) -> Value {
    match value {
        graphql::Value::Null => Value::Null,
        graphql::Value::Bool(boolean) => Value::Bool(boolean),
        graphql::Value::Int(int) => Value::Number(int.into()),
        graphql::Value::Double(double) => serde_json::Number::from_f64(double)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        graphql::Value::String(string) => Value::String(ByteString::from(string)),
        graphql::Value::Array(array) => {
            Value::Array(array.into_iter().map(engine_to_host).collect())
        }
        graphql::Value::Object(object) => Value::Object(
            object
                .into_iter()
                .map(|(key, value)| (ByteString::from(key), engine_to_host(value)))
                .collect(),
        ),
    }
}

/// Convert a host object entry by entry, as done for request variables.
pub fn variables_to_engine(object: &Object) -> graphql::Object {
    object
        .iter()
        .map(|(key, value)| (key.as_str().to_string(), host_to_engine(value)))
        .collect()
}

impl From<&Value> for graphql::Value {
    fn from(value: &Value) -> Self {
        host_to_engine(value)
    }
}

impl From<graphql::Value> for Value {
    fn from(value: graphql::Value) -> Self {
        engine_to_host(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;

    fn samples() -> Vec<Value> {
        vec![
            json!(null),
            json!(true),
            json!(false),
            json!(0),
            json!(-42),
            json!(i64::MIN),
            json!(i64::MAX),
            json!(1.5),
            json!(-0.25),
            json!(1.0),
            json!(""),
            json!("hello"),
            json!([]),
            json!([1, "two", [3.5, null]]),
            json!({}),
            json!({ "a": { "b": [true, { "c": "d" }] }, "e": 7 }),
        ]
    }

    #[test]
    fn host_round_trip() {
        for value in samples() {
            assert_eq!(engine_to_host(host_to_engine(&value)), value, "{value:?}");
        }
    }

    #[test]
    fn engine_round_trip() {
        let values = vec![
            graphql::Value::Null,
            graphql::Value::Bool(true),
            graphql::Value::Int(-3),
            graphql::Value::Int(i64::MAX),
            graphql::Value::Double(2.75),
            graphql::Value::String("x".to_string()),
            graphql::Value::Array(vec![graphql::Value::Int(1), graphql::Value::Null]),
            graphql::Value::from_iter([
                ("z".to_string(), graphql::Value::Int(1)),
                ("a".to_string(), graphql::Value::Object(graphql::Object::new())),
            ]),
        ];
        for value in values {
            assert_eq!(host_to_engine(&engine_to_host(value.clone())), value);
        }
    }

    #[test]
    fn exact_kinds() {
        assert_eq!(host_to_engine(&json!(5)), graphql::Value::Int(5));
        assert_eq!(host_to_engine(&json!(5.5)), graphql::Value::Double(5.5));
        assert_eq!(host_to_engine(&json!(1.0)), graphql::Value::Double(1.0));
        assert_eq!(
            host_to_engine(&json!("text")),
            graphql::Value::String("text".to_string())
        );
    }

    #[test]
    fn unsigned_within_signed_range_is_exact() {
        let value = Value::Number(serde_json::Number::from(i64::MAX as u64));
        assert_eq!(host_to_engine(&value), graphql::Value::Int(i64::MAX));
    }

    #[test]
    fn unsigned_above_signed_range_is_widened() {
        let value = Value::Number(serde_json::Number::from(u64::MAX));
        assert_eq!(
            host_to_engine(&value),
            graphql::Value::Double(18_446_744_073_709_551_615_u64 as f64)
        );
        let value = Value::Number(serde_json::Number::from(i64::MAX as u64 + 1));
        assert_eq!(
            host_to_engine(&value),
            graphql::Value::Double(9_223_372_036_854_775_808.0)
        );
    }

    #[test]
    fn non_finite_doubles_become_null() {
        assert_eq!(engine_to_host(graphql::Value::Double(f64::NAN)), Value::Null);
        assert_eq!(
            engine_to_host(graphql::Value::Double(f64::INFINITY)),
            Value::Null
        );
    }

    #[test]
    fn object_keys_are_preserved() {
        let host = json!({ "b": 1, "a": 2, "c": { "d": null } });
        let engine = host_to_engine(&host);
        let keys: Vec<&str> = engine
            .as_object()
            .expect("an object")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn variables_are_converted_entry_wise() {
        let host = json!({ "id": 1, "names": ["a"] });
        let variables = variables_to_engine(host.as_object().expect("an object"));
        assert_eq!(variables.get("id"), Some(&graphql::Value::Int(1)));
        assert_eq!(
            variables.get("names"),
            Some(&graphql::Value::Array(vec!["a".into()]))
        );
    }
}
