mod support;

use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, api_key: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", api_key)
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn map_returns_the_urls_published_in_the_sitemap() {
    let server = MockServer::start().await;
    let sitemap = format!(
        "<urlset><url><loc>{0}/a</loc></url><url><loc>{0}/b</loc></url></urlset>",
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap))
        .mount(&server)
        .await;

    let (app, _tmp) = support::setup_test_app(100).await;
    let request = post("/v1/map", "key-1", serde_json::json!({ "url": server.uri() }));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn map_with_an_empty_url_is_rejected() {
    let (app, _tmp) = support::setup_test_app(100).await;
    let request = post("/v1/map", "key-1", serde_json::json!({ "url": "" }));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn search_with_an_empty_query_is_rejected() {
    let (app, _tmp) = support::setup_test_app(100).await;
    let request = post("/v1/search", "key-1", serde_json::json!({ "query": "" }));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 400);
}
