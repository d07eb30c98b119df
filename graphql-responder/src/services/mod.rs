//! Tower services and layers turning HTTP requests into GraphQL executions.

use bytes::Bytes;
use http_body_util::Full;

pub mod layers;
pub mod mode;
mod responder;

pub use layers::content_negotiation::ContentNegotiationLayer;
pub use layers::content_negotiation::ContentNegotiationService;
pub use layers::content_negotiation::DecodedContent;
pub use mode::ResponseMode;
pub use responder::GraphQLResponder;
pub use responder::GraphQLResponderBuilder;
pub use responder::ResolverConfiguration;

/// The body of every response the responder produces.
pub type Body = Full<Bytes>;

/// `content-type` of JSON responses.
pub const APPLICATION_JSON_HEADER_VALUE: &str = "application/json";
