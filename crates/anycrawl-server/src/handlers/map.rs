use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use anycrawl_core::orchestrators::run_map;

use crate::dto::{MapRequest, MapResponse, MapResultItem};
use crate::error::ApiError;
use crate::extractors::ApiKeyId;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/v1/map",
    tag = "map",
    request_body = MapRequest,
    responses(
        (status = 200, description = "Discovered URLs", body = MapResponse),
        (status = 400, description = "Validation error"),
        (status = 402, description = "Insufficient credits"),
        (status = 500, description = "Internal error"),
    )
)]
pub async fn map(
    State(state): State<AppState>,
    ApiKeyId(api_key_id): ApiKeyId,
    Json(body): Json<MapRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.url.trim().is_empty() {
        return Err(ApiError::Validation("url must not be empty".to_string()));
    }
    let outcome = run_map(&state.ctx, &api_key_id, &body.url).await?;
    let limit = body.limit.unwrap_or(usize::MAX);
    let data = outcome
        .urls
        .into_iter()
        .take(limit)
        .map(|url| MapResultItem {
            url,
            title: None,
            description: None,
        })
        .collect();
    Ok(Json(MapResponse { data }))
}
