use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/v1/health",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "success": true, "status": "ok" }))
}
