use http::HeaderValue;
use http::header::ACCEPT;
use http::header::ALLOW;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use super::*;
use crate::configuration::Explorer;

/// Context observed by [`Echo`].
#[derive(Clone, Debug)]
struct Caller(String);

impl FromRequestContext for Caller {
    fn from_request_context(request: &RequestContext) -> Self {
        Caller(format!("{} {}", request.method, request.uri.path()))
    }
}

/// Answers every operation with what it was asked to execute.
#[derive(Debug)]
struct Echo;

#[async_trait::async_trait]
impl Executor for Echo {
    type Root = graphql::Value;
    type Context = Caller;

    async fn execute(
        &self,
        request: ExecutionRequest<'_, Self::Root, Self::Context>,
    ) -> graphql::Response {
        let data = graphql::Value::from_iter([
            ("query".to_string(), request.query.into()),
            ("root".to_string(), request.root_value.clone()),
            (
                "context".to_string(),
                request.context.map(|caller| caller.0.clone()).into(),
            ),
            (
                "variables".to_string(),
                graphql::Value::Object(request.variables.clone()),
            ),
            (
                "operationName".to_string(),
                request.operation_name.into(),
            ),
        ]);
        graphql::Response::builder().data(data).build()
    }
}

fn explorer_enabled() -> Configuration {
    Configuration::builder().explorer(Explorer::enabled()).build()
}

async fn send(
    responder: &GraphQLResponder<Echo>,
    request: http::Request<DecodedContent>,
) -> (StatusCode, http::HeaderMap, bytes::Bytes) {
    let response = responder.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    (
        parts.status,
        parts.headers,
        body.collect().await.unwrap().to_bytes(),
    )
}

async fn send_json(
    responder: &GraphQLResponder<Echo>,
    request: http::Request<DecodedContent>,
) -> (StatusCode, serde_json::Value) {
    let (status, headers, body) = send(responder, request).await;
    assert_eq!(
        headers.get(CONTENT_TYPE).unwrap(),
        APPLICATION_JSON_HEADER_VALUE
    );
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> http::Request<DecodedContent> {
    http::Request::get(uri)
        .body(DecodedContent::default())
        .unwrap()
}

#[tokio::test]
async fn executes_the_query_string() {
    let responder = GraphQLResponder::builder(Echo, graphql::Value::from("root")).build();
    let (status, body) = send_json(
        &responder,
        get("http://localhost/graphql?query=%7B%20hello%20%7D&operationName=Hello"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "data": {
                "query": "{ hello }",
                "root": "root",
                "context": null,
                "variables": {},
                "operationName": "Hello"
            }
        })
    );
}

#[tokio::test]
async fn body_parameters_are_used_as_fallback() {
    let responder = GraphQLResponder::builder(Echo, graphql::Value::Null).build();
    let request = http::Request::post("http://localhost/?query=%7B%20fromUrl%20%7D")
        .body(DecodedContent::from_body(serde_json_bytes::json!({
            "query": "{ fromBody }",
            "variables": { "id": 1 },
            "operationName": "FromBody"
        })))
        .unwrap();
    let (status, body) = send_json(&responder, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["query"], "{ fromUrl }");
    assert_eq!(body["data"]["variables"], json!({ "id": 1 }));
    assert_eq!(body["data"]["operationName"], "FromBody");
}

#[tokio::test]
async fn missing_query_is_rejected() {
    let responder = GraphQLResponder::builder(Echo, graphql::Value::Null).build();
    let (status, body) = send_json(&responder, get("http://localhost/graphql")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "errors": [{
                "message": "Must provide query string.",
                "extensions": { "code": "MISSING_QUERY_STRING" }
            }]
        })
    );
}

#[tokio::test]
async fn invalid_variables_are_rejected() {
    let responder = GraphQLResponder::builder(Echo, graphql::Value::Null).build();
    let (status, body) = send_json(
        &responder,
        get("http://localhost/?query=%7Bx%7D&variables=%5B1%5D"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["extensions"]["code"], "INVALID_GRAPHQL_REQUEST");
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    let responder = GraphQLResponder::builder(Echo, graphql::Value::Null).build();
    let request = http::Request::put("http://localhost/?query=%7Bx%7D")
        .body(DecodedContent::default())
        .unwrap();
    let (status, headers, body) = send(&responder, request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers.get(ALLOW).unwrap(), "GET, POST");
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["errors"][0]["extensions"]["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn request_context() {
    let responder = GraphQLResponder::builder(Echo, graphql::Value::Null)
        .request_context()
        .build();
    assert_eq!(responder.resolver_configuration().context().kind(), "request");

    let (_, body) = send_json(&responder, get("http://localhost/graphql?query=%7Bx%7D")).await;
    assert_eq!(body["data"]["context"], "GET /graphql");
}

#[tokio::test]
async fn explicit_context_wins_over_request_context() {
    for responder in [
        GraphQLResponder::builder(Echo, graphql::Value::Null)
            .context(Caller("configured".to_string()))
            .request_context()
            .build(),
        GraphQLResponder::builder(Echo, graphql::Value::Null)
            .request_context()
            .context(Caller("configured".to_string()))
            .build(),
    ] {
        let (_, body) =
            send_json(&responder, get("http://localhost/graphql?query=%7Bx%7D")).await;
        assert_eq!(body["data"]["context"], "configured");
    }
}

#[tokio::test]
async fn explorer_is_served_to_browsers() {
    let responder = GraphQLResponder::builder(Echo, graphql::Value::Null)
        .configuration(explorer_enabled())
        .build();
    let mut request = get("http://localhost/?query=%7B%20hello%20%7D");
    request.headers_mut().insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    );
    let (status, headers, body) = send(&responder, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(CONTENT_TYPE).unwrap(),
        "text/html; charset=utf-8"
    );
    let page = String::from_utf8(body.to_vec()).unwrap();
    assert!(page.contains(r#"query: "{ hello }","#));
    assert!(page.contains(r#"\"query\": \"{ hello }\""#), "{page}");
}

#[tokio::test]
async fn explorer_without_query_does_not_execute() {
    let responder = GraphQLResponder::builder(Echo, graphql::Value::Null)
        .configuration(explorer_enabled())
        .build();
    let mut request = get("http://localhost/");
    request
        .headers_mut()
        .insert(ACCEPT, HeaderValue::from_static("text/html"));
    let (status, _, body) = send(&responder, request).await;

    assert_eq!(status, StatusCode::OK);
    let page = String::from_utf8(body.to_vec()).unwrap();
    assert!(page.contains("query: null,"));
    assert!(page.contains("var initialResult = null;"));
}

#[tokio::test]
async fn raw_requests_get_json() {
    let responder = GraphQLResponder::builder(Echo, graphql::Value::Null)
        .configuration(explorer_enabled())
        .build();
    let mut request = get("http://localhost/?query=%7Bx%7D&raw=true");
    request
        .headers_mut()
        .insert(ACCEPT, HeaderValue::from_static("text/html"));
    let (status, body) = send_json(&responder, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["query"], "{x}");
}

#[tokio::test]
async fn explorer_disabled_by_default() {
    let responder = GraphQLResponder::builder(Echo, graphql::Value::Null).build();
    let mut request = get("http://localhost/?query=%7Bx%7D");
    request
        .headers_mut()
        .insert(ACCEPT, HeaderValue::from_static("text/html"));
    let (status, _) = send_json(&responder, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn custom_explorer() {
    struct Plain;

    impl ExplorerRenderer for Plain {
        fn render(&self, page: &ExplorerPage<'_>) -> String {
            format!("explorer for {}", page.query.unwrap_or("nothing"))
        }
    }

    let responder = GraphQLResponder::builder(Echo, graphql::Value::Null)
        .configuration(explorer_enabled())
        .explorer(Plain)
        .build();
    let mut request = get("http://localhost/");
    request
        .headers_mut()
        .insert(ACCEPT, HeaderValue::from_static("text/html"));
    let (_, _, body) = send(&responder, request).await;
    assert_eq!(&body[..], b"explorer for nothing");
}
