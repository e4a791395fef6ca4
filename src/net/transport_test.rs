use super::*;
use httpmock::prelude::*;
use serde_json::json;

fn transport_for(server: &MockServer) -> ReqwestTransport {
    let config = ClientConfig::default().with_api_base_url(&server.url("/api"));
    ReqwestTransport::new(&config).unwrap()
}

#[test]
fn base_url_drops_trailing_slash() {
    let config = ClientConfig::default().with_api_base_url("http://localhost:8080/api/");
    let transport = ReqwestTransport::new(&config).unwrap();
    assert_eq!(transport.base_url(), "http://localhost:8080/api");
    assert_eq!(transport.url_for("/books"), "http://localhost:8080/api/books");
}

#[tokio::test]
async fn sends_query_and_reads_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/books").query_param("keyword", "rust");
            then.status(200).body(r#"{"content":[]}"#);
        })
        .await;

    let request = ApiRequest::get("/books").with_query("keyword", "rust");
    let response = transport_for(&server).send(&request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"content":[]}"#);
}

#[tokio::test]
async fn sends_bearer_header_and_json_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/cart/items")
                .header("authorization", "Bearer h.p.s")
                .json_body(json!({ "bookId": 1, "quantity": 2 }));
            then.status(200).json_body(json!({ "items": [] }));
        })
        .await;

    let mut request = ApiRequest::post("/cart/items").with_json(json!({ "bookId": 1, "quantity": 2 }));
    request.headers.insert(
        reqwest::header::AUTHORIZATION,
        reqwest::header::HeaderValue::from_static("Bearer h.p.s"),
    );
    let response = transport_for(&server).send(&request).await.unwrap();

    mock.assert_async().await;
    assert!(response.is_success());
}

#[tokio::test]
async fn error_statuses_pass_through_unchanged() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/cart");
            then.status(401).body(r#"{"detail":"Authentication required"}"#);
        })
        .await;

    let response = transport_for(&server).send(&ApiRequest::get("/cart")).await.unwrap();

    assert_eq!(response.status, 401);
    assert_eq!(response.error_message(), "Authentication required");
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let config = ClientConfig::default().with_api_base_url("http://127.0.0.1:1/api");
    let transport = ReqwestTransport::new(&config).unwrap();

    let err = transport.send(&ApiRequest::get("/books")).await.unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
}
