//! Resolves HTTP requests into GraphQL executions.
//!
//! A [`GraphQLResponder`] sits between a host HTTP server and a GraphQL
//! [`Executor`]. For every request it extracts the GraphQL parameters from
//! the query string or the body, picks either the JSON API or the GraphiQL
//! explorer, runs the operation and shapes the HTTP response.
//!
//! ```ignore
//! let schema = SchemaExecutor::<RequestContext>::parse("type Query { hello: String }")?
//!     .resolver("Query", "hello", |_| Ok("world".into()));
//! let responder = GraphQLResponder::builder(schema, graphql::Value::Null)
//!     .request_context()
//!     .configuration(Configuration::builder().explorer(Explorer::enabled()).build())
//!     .build();
//! let service = responder.http_service();
//! ```

#![warn(unreachable_pub)]

pub mod json_ext;

pub mod configuration;
mod context;
pub mod convert;
pub mod error;
pub mod executor;
pub mod explorer;
pub mod graphql;
mod request;
pub mod services;

pub use configuration::Configuration;
pub use context::ContextStrategy;
pub use context::FromRequestContext;
pub use context::RequestContext;
pub use executor::ExecutionRequest;
pub use executor::Executor;
pub use executor::SchemaExecutor;
pub use request::RequestParameters;
pub use services::GraphQLResponder;
pub use services::ResolverConfiguration;
