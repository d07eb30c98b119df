use http::HeaderMap;
use http::Method;
use http::Uri;
use http::Version;
use http::request::Parts;

/// The inbound HTTP request, as seen by resolvers when the request itself is
/// used as the execution context.
#[derive(Clone, Debug)]
pub struct RequestContext {
    /// The request method.
    pub method: Method,
    /// The request URI, including the query string.
    pub uri: Uri,
    /// The HTTP version.
    pub version: Version,
    /// The request headers.
    pub headers: HeaderMap,
}

impl From<&Parts> for RequestContext {
    fn from(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            version: parts.version,
            headers: parts.headers.clone(),
        }
    }
}

/// Context types that can be built from the inbound request.
///
/// Implementing this for an executor's context type allows the responder to
/// hand every execution the request it came from, without wiring an explicit
/// context.
pub trait FromRequestContext: Sized {
    /// Build the context for one execution.
    fn from_request_context(request: &RequestContext) -> Self;
}

impl FromRequestContext for RequestContext {
    fn from_request_context(request: &RequestContext) -> Self {
        request.clone()
    }
}

/// Which context the engine receives, decided once when the responder is built.
pub enum ContextStrategy<C> {
    /// Build the context from each inbound request.
    Request(fn(&RequestContext) -> C),
    /// Hand every execution the same configured context.
    Explicit(C),
    /// Execute without a context.
    None,
}

impl<C> ContextStrategy<C> {
    /// Resolve the strategy from what was configured.
    ///
    /// An explicit context always wins; the request is only used when it was
    /// asked for and nothing explicit was given.
    pub(crate) fn resolve(explicit: Option<C>, from_request: Option<fn(&RequestContext) -> C>) -> Self {
        match (explicit, from_request) {
            (Some(context), _) => ContextStrategy::Explicit(context),
            (None, Some(from_request)) => ContextStrategy::Request(from_request),
            (None, None) => ContextStrategy::None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ContextStrategy::Request(_) => "request",
            ContextStrategy::Explicit(_) => "explicit",
            ContextStrategy::None => "none",
        }
    }
}

impl<C> std::fmt::Debug for ContextStrategy<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ContextStrategy").field(&self.kind()).finish()
    }
}
