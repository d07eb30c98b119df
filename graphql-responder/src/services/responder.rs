//! The responder service: one HTTP request in, one GraphQL response out.

use std::fmt;
use std::sync::Arc;
use std::task::Poll;

use futures::future::BoxFuture;
use http::HeaderValue;
use http::Method;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use tower::BoxError;
use tower::Layer;
use tower::Service;
use tracing::Instrument;

use super::APPLICATION_JSON_HEADER_VALUE;
use super::Body;
use super::ContentNegotiationLayer;
use super::ContentNegotiationService;
use super::DecodedContent;
use super::ResponseMode;
use crate::configuration::Configuration;
use crate::context::ContextStrategy;
use crate::context::FromRequestContext;
use crate::context::RequestContext;
use crate::convert;
use crate::error::ResponderError;
use crate::executor::ExecutionRequest;
use crate::executor::Executor;
use crate::explorer::ExplorerPage;
use crate::explorer::ExplorerRenderer;
use crate::explorer::GraphiQL;
use crate::graphql;
use crate::request::RequestParameters;

#[cfg(test)]
mod tests;

/// Everything a responder needs to answer requests, fixed at build time.
pub struct ResolverConfiguration<E: Executor> {
    executor: E,
    root_value: E::Root,
    context: ContextStrategy<E::Context>,
    configuration: Configuration,
    explorer: Box<dyn ExplorerRenderer>,
}

impl<E: Executor> ResolverConfiguration<E> {
    /// The responder configuration.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// The engine requests are executed with.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// How the execution context is obtained.
    pub fn context(&self) -> &ContextStrategy<E::Context> {
        &self.context
    }

    /// Run the operation of a request.
    ///
    /// Missing variables are handed to the engine as an empty object.
    pub async fn execute(
        &self,
        query: &str,
        parameters: &RequestParameters,
        parts: &Parts,
    ) -> graphql::Response {
        let no_variables = graphql::Object::new();
        let from_request;
        let context = match &self.context {
            ContextStrategy::Request(build) => {
                from_request = build(&RequestContext::from(parts));
                Some(&from_request)
            }
            ContextStrategy::Explicit(context) => Some(context),
            ContextStrategy::None => None,
        };

        let span = tracing::info_span!(
            "graphql_execution",
            graphql.operation.name = parameters.operation_name().unwrap_or_default(),
            graphql.context = self.context.kind(),
            "otel.kind" = "INTERNAL"
        );

        self.executor
            .execute(ExecutionRequest {
                query,
                root_value: &self.root_value,
                context,
                variables: parameters.variables().unwrap_or(&no_variables),
                operation_name: parameters.operation_name(),
            })
            .instrument(span)
            .await
    }

    /// Answer one request.
    ///
    /// Only transport failures are returned as errors. Requests the responder
    /// refuses are answered with a client error status.
    pub async fn respond(
        &self,
        request: http::Request<DecodedContent>,
    ) -> Result<http::Response<Body>, BoxError> {
        let (parts, content) = request.into_parts();

        if parts.method != Method::GET && parts.method != Method::POST {
            return Ok(ResponderError::MethodNotAllowed(parts.method).to_response());
        }

        let parameters = match RequestParameters::extract(&parts, &content) {
            Ok(parameters) => parameters,
            Err(error) => {
                tracing::debug!(%error, "invalid GraphQL request");
                return Ok(error.to_response());
            }
        };

        match ResponseMode::select(
            self.configuration.explorer.enabled,
            parameters.raw(),
            &parts.headers,
        ) {
            ResponseMode::Json => {
                let Some(query) = parameters.query() else {
                    return Ok(ResponderError::MissingQuery.to_response());
                };
                let response = self.execute(query, &parameters, &parts).await;
                let body = serde_json::to_vec(&convert::engine_to_host(response.into_value()))?;

                Ok(http::Response::builder()
                    .status(StatusCode::OK)
                    .header(
                        CONTENT_TYPE,
                        HeaderValue::from_static(APPLICATION_JSON_HEADER_VALUE),
                    )
                    .body(Body::from(body))?)
            }
            ResponseMode::Explorer => {
                let result = match parameters.query() {
                    Some(query) => Some(convert::engine_to_host(
                        self.execute(query, &parameters, &parts).await.into_value(),
                    )),
                    None => None,
                };
                let page = self.explorer.render(&ExplorerPage {
                    query: parameters.query(),
                    variables: parameters.variables(),
                    operation_name: parameters.operation_name(),
                    result: result.as_ref(),
                });

                Ok(http::Response::builder()
                    .status(StatusCode::OK)
                    .header(
                        CONTENT_TYPE,
                        HeaderValue::from_static(mime::TEXT_HTML_UTF_8.as_ref()),
                    )
                    .body(Body::from(page))?)
            }
        }
    }
}

impl<E: Executor + fmt::Debug> fmt::Debug for ResolverConfiguration<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverConfiguration")
            .field("executor", &self.executor)
            .field("context", &self.context)
            .field("configuration", &self.configuration)
            .finish_non_exhaustive()
    }
}

/// A tower service answering GraphQL requests with an [`Executor`].
///
/// Clones share the same configuration. The service is always ready.
pub struct GraphQLResponder<E: Executor> {
    configuration: Arc<ResolverConfiguration<E>>,
}

impl<E: Executor> Clone for GraphQLResponder<E> {
    fn clone(&self) -> Self {
        Self {
            configuration: self.configuration.clone(),
        }
    }
}

impl<E: Executor + fmt::Debug> fmt::Debug for GraphQLResponder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GraphQLResponder")
            .field(&self.configuration)
            .finish()
    }
}

impl<E: Executor> GraphQLResponder<E> {
    /// Start building a responder for `executor`, with `root_value` as the
    /// parent of top-level fields.
    pub fn builder(executor: E, root_value: E::Root) -> GraphQLResponderBuilder<E> {
        GraphQLResponderBuilder {
            executor,
            root_value,
            context: None,
            from_request: None,
            configuration: Configuration::default(),
            explorer: None,
        }
    }

    /// What the responder was built with.
    pub fn resolver_configuration(&self) -> &ResolverConfiguration<E> {
        &self.configuration
    }

    /// The responder behind a [`ContentNegotiationLayer`], accepting any HTTP body.
    pub fn http_service(&self) -> ContentNegotiationService<Self> {
        ContentNegotiationLayer::new().layer(self.clone())
    }
}

impl<E: Executor> Service<http::Request<DecodedContent>> for GraphQLResponder<E> {
    type Response = http::Response<Body>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<DecodedContent>) -> Self::Future {
        let configuration = self.configuration.clone();
        Box::pin(async move { configuration.respond(request).await })
    }
}

/// Builder for [`GraphQLResponder`].
pub struct GraphQLResponderBuilder<E: Executor> {
    executor: E,
    root_value: E::Root,
    context: Option<E::Context>,
    from_request: Option<fn(&RequestContext) -> E::Context>,
    configuration: Configuration,
    explorer: Option<Box<dyn ExplorerRenderer>>,
}

impl<E: Executor> GraphQLResponderBuilder<E> {
    /// Hand every execution this context.
    ///
    /// Takes precedence over [`request_context`](Self::request_context).
    pub fn context(mut self, context: E::Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Replace the default configuration.
    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Replace the GraphiQL page with another explorer.
    pub fn explorer(mut self, renderer: impl ExplorerRenderer) -> Self {
        self.explorer = Some(Box::new(renderer));
        self
    }

    /// Finish the responder, deciding how its execution context is obtained.
    pub fn build(self) -> GraphQLResponder<E> {
        let context = ContextStrategy::resolve(self.context, self.from_request);
        tracing::debug!(
            context = context.kind(),
            explorer = self.configuration.explorer.enabled,
            "building GraphQL responder"
        );

        GraphQLResponder {
            configuration: Arc::new(ResolverConfiguration {
                executor: self.executor,
                root_value: self.root_value,
                context,
                configuration: self.configuration,
                explorer: self.explorer.unwrap_or_else(|| Box::new(GraphiQL)),
            }),
        }
    }
}

impl<E> GraphQLResponderBuilder<E>
where
    E: Executor,
    E::Context: FromRequestContext,
{
    /// Build the context of each execution from the inbound request.
    pub fn request_context(mut self) -> Self {
        self.from_request = Some(<E::Context as FromRequestContext>::from_request_context);
        self
    }
}
