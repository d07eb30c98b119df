//! The seam between the responder and a GraphQL execution engine.

mod schema;

pub use schema::ResolveInfo;
pub use schema::SchemaError;
pub use schema::SchemaExecutor;

use crate::graphql;

/// Everything an engine needs to run one operation.
#[derive(Debug)]
pub struct ExecutionRequest<'a, R, C> {
    /// The operation text.
    pub query: &'a str,
    /// The parent value of top-level fields.
    pub root_value: &'a R,
    /// The context handed to every resolver, if any.
    pub context: Option<&'a C>,
    /// Variable bindings, already converted from the request.
    pub variables: &'a graphql::Object,
    /// The operation to run when the document holds several.
    pub operation_name: Option<&'a str>,
}

/// A GraphQL execution engine.
///
/// Execution never fails as a whole: syntax, validation and resolver errors
/// are reported in [`graphql::Response::errors`]. Implementations must be
/// reentrant, the responder calls `execute` concurrently through a shared
/// reference.
#[async_trait::async_trait]
pub trait Executor: Send + Sync + 'static {
    /// The type of the root value.
    type Root: Send + Sync + 'static;
    /// The type of the per-execution context.
    type Context: Send + Sync + 'static;

    async fn execute(
        &self,
        request: ExecutionRequest<'_, Self::Root, Self::Context>,
    ) -> graphql::Response;
}
