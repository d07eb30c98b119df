//! Decodes request bodies and query strings before they reach the responder.

use std::task::Poll;

use futures::future::BoxFuture;
use http::HeaderMap;
use http::Method;
use http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use mediatype::MediaType;
use mediatype::names::APPLICATION;
use mediatype::names::JSON;
use serde_json_bytes::ByteString;
use serde_json_bytes::json;
use tower::BoxError;
use tower::Layer;
use tower::Service;

use crate::error::ResponderError;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::services::Body;

/// A request after content negotiation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedContent {
    /// The decoded body, `None` when the request had no body.
    pub body: Option<Value>,
    /// The query string as a structured value, with bracket notation keys
    /// such as `variables[id]=1` turned into nested objects.
    pub query: Option<Value>,
}

impl DecodedContent {
    /// Content with a JSON body and no query string.
    pub fn from_body(body: Value) -> Self {
        Self {
            body: Some(body),
            query: None,
        }
    }
}

/// [`Layer`] decoding request bodies into [`DecodedContent`].
#[derive(Clone, Debug, Default)]
pub struct ContentNegotiationLayer {}

impl ContentNegotiationLayer {
    /// A layer with no options.
    pub fn new() -> Self {
        Self {}
    }
}

impl<S> Layer<S> for ContentNegotiationLayer {
    type Service = ContentNegotiationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ContentNegotiationService { inner }
    }
}

/// Service decoding the raw body of a request for the wrapped service.
///
/// Bodies are read in full. Supported content types are JSON (including any
/// `+json` suffix, and requests without a content type),
/// `application/x-www-form-urlencoded` and `application/graphql`. Anything
/// else is answered with `415 Unsupported Media Type` without calling the
/// wrapped service.
#[derive(Clone, Debug)]
pub struct ContentNegotiationService<S> {
    inner: S,
}

impl<S, B> Service<http::Request<B>> for ContentNegotiationService<S>
where
    S: Service<http::Request<DecodedContent>, Response = http::Response<Body>, Error = BoxError>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = http::Response<Body>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<B>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let query = parts
                .uri
                .query()
                .and_then(|query| {
                    structured_query(query.as_bytes())
                        .inspect_err(|error| tracing::debug!(%error, "ignoring query string"))
                        .ok()
                });

            // other methods are rejected by the responder, their body is never read
            if parts.method != Method::GET && parts.method != Method::POST {
                let content = DecodedContent { body: None, query };
                return inner.call(http::Request::from_parts(parts, content)).await;
            }

            let bytes = body
                .collect()
                .await
                .map_err(Into::<BoxError>::into)?
                .to_bytes();
            let body = match decode_body(&parts.headers, &bytes) {
                Ok(body) => body,
                Err(error) => {
                    tracing::debug!(%error, "rejecting request body");
                    return Ok(error.to_response());
                }
            };

            let content = DecodedContent { body, query };
            inner.call(http::Request::from_parts(parts, content)).await
        })
    }
}

fn decode_body(headers: &HeaderMap, bytes: &[u8]) -> Result<Option<Value>, ResponderError> {
    if bytes.is_empty() {
        return Ok(None);
    }

    let Some(raw_content_type) = headers.get(CONTENT_TYPE) else {
        return decode_json(bytes).map(Some);
    };
    let content_type = raw_content_type
        .to_str()
        .ok()
        .and_then(|str| MediaType::parse(str).ok());

    match content_type {
        Some(mime)
            if mime.ty == APPLICATION && (mime.subty == JSON || mime.suffix == Some(JSON)) =>
        {
            decode_json(bytes).map(Some)
        }
        Some(mime)
            if mime.ty == APPLICATION && mime.subty.as_str() == "x-www-form-urlencoded" =>
        {
            structured_query(bytes).map(Some)
        }
        Some(mime) if mime.ty == APPLICATION && mime.subty.as_str() == "graphql" => {
            let query = std::str::from_utf8(bytes)
                .map_err(|error| ResponderError::InvalidBody(error.to_string()))?;
            Ok(Some(json!({ "query": query })))
        }
        Some(mime) => Err(ResponderError::UnsupportedMediaType(mime.to_string())),
        None => Err(ResponderError::UnsupportedMediaType(
            String::from_utf8_lossy(raw_content_type.as_bytes()).into_owned(),
        )),
    }
}

fn decode_json(bytes: &[u8]) -> Result<Value, ResponderError> {
    serde_json::from_slice(bytes).map_err(|error| ResponderError::InvalidBody(error.to_string()))
}

/// Deepest bracket nesting accepted in a url encoded key.
const MAX_KEY_DEPTH: usize = 32;

/// Parse url encoded pairs into a structured value.
///
/// `a[b][c]=1` nests objects, `a[]=1&a[]=2` appends to a list. Values stay
/// strings. When a key repeats, the last value wins. Keys nesting deeper than
/// [`MAX_KEY_DEPTH`] are rejected.
pub(crate) fn structured_query(encoded: &[u8]) -> Result<Value, ResponderError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(encoded)
        .map_err(|error| ResponderError::InvalidBody(error.to_string()))?;
    let mut root = Object::new();
    for (key, value) in pairs {
        let (head, path) = split_key(&key);
        if path.len() > MAX_KEY_DEPTH {
            return Err(ResponderError::InvalidBody(format!(
                "key `{head}` nests deeper than {MAX_KEY_DEPTH} levels"
            )));
        }
        insert(&mut root, head, &path, Value::String(ByteString::from(value)));
    }
    Ok(Value::Object(root))
}

fn split_key(key: &str) -> (&str, Vec<&str>) {
    match key.find('[') {
        Some(start) if start > 0 && key.ends_with(']') => {
            let path = key[start + 1..key.len() - 1].split("][").collect();
            (&key[..start], path)
        }
        _ => (key, Vec::new()),
    }
}

fn insert(object: &mut Object, key: &str, path: &[&str], value: Value) {
    match path.split_first() {
        None => {
            object.insert(key, value);
        }
        Some((next, rest)) => {
            let slot = object.entry(key).or_insert(Value::Null);
            insert_into(slot, next, rest, value);
        }
    }
}

fn insert_into(slot: &mut Value, key: &str, path: &[&str], value: Value) {
    if key.is_empty() {
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            match path.split_first() {
                None => items.push(value),
                Some((next, rest)) => {
                    let mut item = Value::Null;
                    insert_into(&mut item, next, rest, value);
                    items.push(item);
                }
            }
        }
    } else {
        if !slot.is_object() {
            *slot = Value::Object(Object::new());
        }
        if let Value::Object(object) = slot {
            insert(object, key, path, value);
        }
    }
}
