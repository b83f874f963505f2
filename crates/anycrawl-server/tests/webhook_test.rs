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

fn post(uri: String, api_key: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", api_key)
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn create_then_fetch_a_subscription_never_echoes_the_secret_again() {
    let (app, _tmp) = support::setup_test_app(100).await;

    let create = post(
        "/v1/webhooks".to_string(),
        "key-1",
        serde_json::json!({ "url": "https://hooks.example.com/a", "event_types": ["job.completed"] }),
    );
    let response = app.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), 201);
    let created = json_body(response).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert!(created["secret"].as_str().unwrap().starts_with("whsec_") || !created["secret"].as_str().unwrap().is_empty());

    let get_req = Request::builder()
        .uri(format!("/v1/webhooks/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(get_req).await.unwrap();
    assert_eq!(response.status(), 200);
    let fetched = json_body(response).await;
    assert_eq!(fetched["id"], id);
    assert!(fetched.get("secret").is_none());
}

#[tokio::test]
async fn creating_a_subscription_without_event_types_is_rejected() {
    let (app, _tmp) = support::setup_test_app(100).await;
    let create = post(
        "/v1/webhooks".to_string(),
        "key-1",
        serde_json::json!({ "url": "https://hooks.example.com/a", "event_types": [] }),
    );
    let response = app.oneshot(create).await.unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn deactivating_then_reactivating_a_subscription_round_trips() {
    let (app, _tmp) = support::setup_test_app(100).await;
    let create = post(
        "/v1/webhooks".to_string(),
        "key-1",
        serde_json::json!({ "url": "https://hooks.example.com/a", "event_types": ["job.completed"] }),
    );
    let response = app.clone().oneshot(create).await.unwrap();
    let id = json_body(response).await["id"].as_str().unwrap().to_string();

    let deactivate = Request::builder()
        .method("POST")
        .uri(format!("/v1/webhooks/{id}/deactivate"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(deactivate).await.unwrap();
    assert_eq!(json_body(response).await["is_active"], false);

    let activate = Request::builder()
        .method("POST")
        .uri(format!("/v1/webhooks/{id}/activate"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(activate).await.unwrap();
    assert_eq!(json_body(response).await["is_active"], true);
}

#[tokio::test]
async fn test_delivery_posts_to_the_subscribed_url_and_reports_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (app, _tmp) = support::setup_test_app(100).await;
    let create = post(
        "/v1/webhooks".to_string(),
        "key-1",
        serde_json::json!({ "url": format!("{}/hook", server.uri()), "event_types": ["job.completed"] }),
    );
    let response = app.clone().oneshot(create).await.unwrap();
    let id = json_body(response).await["id"].as_str().unwrap().to_string();

    let test_req = Request::builder()
        .method("POST")
        .uri(format!("/v1/webhooks/{id}/test"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(test_req).await.unwrap();
    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["delivered"], true);

    let deliveries_req = Request::builder()
        .uri(format!("/v1/webhooks/{id}/deliveries"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(deliveries_req).await.unwrap();
    assert_eq!(response.status(), 200);
    let deliveries = json_body(response).await;
    assert_eq!(deliveries.as_array().unwrap().len(), 1);
    assert_eq!(deliveries[0]["status"], "delivered");
}

#[tokio::test]
async fn deleting_a_subscription_makes_it_a_404_afterward() {
    let (app, _tmp) = support::setup_test_app(100).await;
    let create = post(
        "/v1/webhooks".to_string(),
        "key-1",
        serde_json::json!({ "url": "https://hooks.example.com/a", "event_types": ["job.completed"] }),
    );
    let response = app.clone().oneshot(create).await.unwrap();
    let id = json_body(response).await["id"].as_str().unwrap().to_string();

    let delete_req = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/webhooks/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(delete_req).await.unwrap();
    assert_eq!(response.status(), 200);

    let get_req = Request::builder()
        .uri(format!("/v1/webhooks/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(get_req).await.unwrap();
    assert_eq!(response.status(), 404);
}
