//! Types on the execution engine side of the boundary: values, errors and
//! responses.

mod response;
mod value;

use std::fmt;

use apollo_compiler::response::GraphQLError as CompilerError;
pub use response::Response;
pub use value::Object;
pub use value::Value;

/// The error location
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Location {
    /// The line number
    pub line: u32,
    /// The column number
    pub column: u32,
}

/// One segment of the path to the field an [`Error`] refers to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathElement {
    /// A field in an object, by response key.
    Key(String),
    /// An index in a list.
    Index(usize),
}

/// The path to a field in [`Response::data`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Path(pub Vec<PathElement>);

impl Path {
    pub(crate) fn to_value(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|element| match element {
                    PathElement::Key(key) => Value::String(key.clone()),
                    PathElement::Index(index) => Value::Int(*index as i64),
                })
                .collect(),
        )
    }
}

/// A [GraphQL error](https://spec.graphql.org/October2021/#sec-Errors)
/// as may be found in the `errors` field of a GraphQL [`Response`].
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Error {
    /// The error message.
    pub message: String,

    /// The locations of the error in the GraphQL document of the originating request.
    pub locations: Vec<Location>,

    /// If this is a field error, the path to that field in [`Response::data`]
    pub path: Option<Path>,

    /// The optional GraphQL extensions for this error.
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl Error {
    /// Returns a builder that builds a GraphQL [`Error`] from its components.
    ///
    /// Builder methods:
    ///
    /// * `.message(impl Into<`[`String`]`>)`
    ///   Required.
    ///
    /// * `.locations(impl Into<`[`Vec`]`<`[`Location`]`>>)`
    ///   Optional, defaults to empty.
    ///
    /// * `.path(impl Into<`[`Path`]`>)`
    ///   Optional.
    ///
    /// * `.extension_code(impl Into<`[`String`]`>)`
    ///   Optional. Sets `code` in the extensions.
    #[builder(visibility = "pub")]
    fn new(
        message: String,
        locations: Vec<Location>,
        path: Option<Path>,
        extension_code: Option<String>,
    ) -> Self {
        let mut extensions = Object::new();
        if let Some(code) = extension_code {
            extensions.insert("code".to_string(), Value::String(code));
        }
        Self {
            message,
            locations,
            path,
            extensions,
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        let mut object = Object::new();
        object.insert("message".to_string(), Value::String(self.message.clone()));
        if !self.locations.is_empty() {
            object.insert(
                "locations".to_string(),
                Value::Array(
                    self.locations
                        .iter()
                        .map(|location| {
                            Value::Object(Object::from([
                                ("line".to_string(), Value::Int(location.line.into())),
                                ("column".to_string(), Value::Int(location.column.into())),
                            ]))
                        })
                        .collect(),
                ),
            );
        }
        if let Some(path) = &self.path {
            object.insert("path".to_string(), path.to_value());
        }
        if !self.extensions.is_empty() {
            object.insert(
                "extensions".to_string(),
                Value::Object(self.extensions.clone()),
            );
        }
        Value::Object(object)
    }
}

/// Displays (only) the error message.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl From<CompilerError> for Error {
    fn from(error: CompilerError) -> Self {
        let CompilerError {
            message, locations, ..
        } = error;
        let locations = locations
            .into_iter()
            .map(|location| Location {
                line: location.line as u32,
                column: location.column as u32,
            })
            .collect();
        Self::builder()
            .message(message)
            .locations(locations)
            .extension_code("GRAPHQL_PARSE_FAILED")
            .build()
    }
}
