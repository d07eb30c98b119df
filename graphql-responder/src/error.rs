//! Responder errors.
use displaydoc::Display;
use http::HeaderValue;
use http::Method;
use http::StatusCode;
use http::header::ALLOW;
use http::header::CONTENT_TYPE;
use thiserror::Error;

use crate::convert;
use crate::graphql;
use crate::services::APPLICATION_JSON_HEADER_VALUE;
use crate::services::Body;

/// Errors that reject a request before anything is executed.
///
/// These are the only failures that surface as HTTP client errors. Errors
/// raised by the engine while parsing, validating or executing an operation
/// are part of a successful response instead.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResponderError {
    /// Must provide query string.
    MissingQuery,

    /// invalid `variables` parameter: {0}
    InvalidVariables(String),

    /// failed to deserialize the request body: {0}
    InvalidBody(String),

    /// 'content-type' header can't be {0:?}, use "application/json", "application/x-www-form-urlencoded" or "application/graphql"
    UnsupportedMediaType(String),

    /// method {0} is not allowed, use GET or POST
    MethodNotAllowed(Method),
}

impl ResponderError {
    /// The HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ResponderError::MissingQuery
            | ResponderError::InvalidVariables(_)
            | ResponderError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ResponderError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ResponderError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// The `code` extension of the GraphQL error in the response body.
    pub fn extension_code(&self) -> &'static str {
        match self {
            ResponderError::MissingQuery => "MISSING_QUERY_STRING",
            ResponderError::InvalidVariables(_) | ResponderError::InvalidBody(_) => {
                "INVALID_GRAPHQL_REQUEST"
            }
            ResponderError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ResponderError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
        }
    }

    /// Convert the error to a GraphQL error.
    pub fn to_graphql_error(&self) -> graphql::Error {
        graphql::Error::builder()
            .message(self.to_string())
            .extension_code(self.extension_code())
            .build()
    }

    /// The HTTP response rejecting the request.
    ///
    /// Request headers are never copied into the response.
    pub fn to_response(&self) -> http::Response<Body> {
        let value = graphql::Response::from_errors(vec![self.to_graphql_error()]).into_value();
        let body = serde_json::to_vec(&convert::engine_to_host(value))
            .unwrap_or_else(|_| br#"{"errors":[{"message":"bad request"}]}"#.to_vec());

        let mut response = http::Response::new(Body::from(body));
        *response.status_mut() = self.status_code();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_JSON_HEADER_VALUE),
        );
        if let ResponderError::MethodNotAllowed(_) = self {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET, POST"));
        }
        response
    }
}
