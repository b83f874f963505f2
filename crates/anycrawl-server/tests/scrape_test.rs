mod support;

use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn json_request(method: &str, uri: String, api_key: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(serde_json::to_vec(&body).unwrap())).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn scrape_without_an_api_key_is_rejected() {
    let (app, _tmp) = support::setup_test_app(100).await;

    let request = json_request(
        "POST",
        "/v1/scrape".to_string(),
        None,
        serde_json::json!({ "url": "https://example.com" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 400);
    let body = json_body(response).await;
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn scrape_with_an_empty_url_is_rejected() {
    let (app, _tmp) = support::setup_test_app(100).await;

    let request = json_request(
        "POST",
        "/v1/scrape".to_string(),
        Some("key-1"),
        serde_json::json!({ "url": "" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn scrape_happy_path_returns_the_scraped_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><h1>Hi</h1></body></html>"))
        .mount(&server)
        .await;

    let (app, _tmp) = support::setup_test_app(100).await;
    let url = format!("{}/article", server.uri());
    let request = json_request(
        "POST",
        "/v1/scrape".to_string(),
        Some("key-1"),
        serde_json::json!({ "url": url }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert!(body["data"].is_object());
}

#[tokio::test]
async fn scrape_with_insufficient_credits_is_rejected_with_payment_required() {
    let (app, _tmp) = support::setup_test_app(0).await;

    let request = json_request(
        "POST",
        "/v1/scrape".to_string(),
        Some("key-1"),
        serde_json::json!({ "url": "https://example.com" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 402);
    let body = json_body(response).await;
    assert_eq!(body["error"], "insufficient_credits");
}
