use super::Error;
use super::Object;
use super::Value;

/// The result of executing one GraphQL operation.
///
/// Errors raised while parsing, validating or executing the operation are not
/// transport failures: they travel in [`Response::errors`] next to whatever
/// data could be produced.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct Response {
    /// The response data, absent when execution did not start.
    pub data: Option<Value>,

    /// The optional graphql errors encountered.
    pub errors: Vec<Error>,
}

#[buildstructor::buildstructor]
impl Response {
    /// Constructor
    #[builder(visibility = "pub")]
    fn new(data: Option<Value>, errors: Vec<Error>) -> Self {
        Self { data, errors }
    }

    /// A response without data, as produced when the request could not be
    /// executed at all.
    pub fn from_errors(errors: Vec<Error>) -> Self {
        Self { data: None, errors }
    }

    /// The response as an engine side object: `{ errors?, data? }`.
    pub fn into_value(self) -> Value {
        let mut object = Object::new();
        if !self.errors.is_empty() {
            object.insert(
                "errors".to_string(),
                Value::Array(self.errors.iter().map(Error::to_value).collect()),
            );
        }
        if let Some(data) = self.data {
            object.insert("data".to_string(), data);
        }
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::Location;
    use crate::graphql::Path;
    use crate::graphql::PathElement;

    #[test]
    fn data_only() {
        let response = Response::builder()
            .data(Value::from_iter([("hello".to_string(), "world".into())]))
            .build();
        assert_eq!(
            response.into_value(),
            Value::from_iter([(
                "data".to_string(),
                Value::from_iter([("hello".to_string(), "world".into())])
            )])
        );
    }

    #[test]
    fn errors_come_with_locations_and_path() {
        let response = Response::builder()
            .data(Value::from_iter([("hello".to_string(), Value::Null)]))
            .error(
                Error::builder()
                    .message("boom")
                    .location(Location { line: 1, column: 3 })
                    .path(Path(vec![
                        PathElement::Key("hello".to_string()),
                        PathElement::Index(0),
                    ]))
                    .build(),
            )
            .build();
        let value = response.into_value();
        let error = &value.get("errors").and_then(|errors| match errors {
            Value::Array(errors) => errors.first().cloned(),
            _ => None,
        });
        let error = error.as_ref().expect("one error");
        assert_eq!(error.get("message"), Some(&Value::from("boom")));
        assert_eq!(
            error.get("locations"),
            Some(&Value::Array(vec![Value::from_iter([
                ("line".to_string(), Value::Int(1)),
                ("column".to_string(), Value::Int(3)),
            ])]))
        );
        assert_eq!(
            error.get("path"),
            Some(&Value::Array(vec!["hello".into(), Value::Int(0)]))
        );
        assert!(error.get("extensions").is_none());
        assert_eq!(value.get("data").and_then(|d| d.get("hello")), Some(&Value::Null));
    }

    #[test]
    fn no_data_when_execution_did_not_start() {
        let value = Response::from_errors(vec![Error::builder().message("nope").build()])
            .into_value();
        assert!(value.get("data").is_none());
        assert!(value.get("errors").is_some());
    }
}
