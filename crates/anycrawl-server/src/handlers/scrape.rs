use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use anycrawl_core::orchestrators::run_scrape;
use anycrawl_core::request::ScrapeOptions;

use crate::dto::{ScrapeRequest, ScrapeResponse};
use crate::error::ApiError;
use crate::extractors::ApiKeyId;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/v1/scrape",
    tag = "scrape",
    request_body = ScrapeRequest,
    responses(
        (status = 200, description = "Page scraped", body = ScrapeResponse),
        (status = 400, description = "Validation error"),
        (status = 402, description = "Insufficient credits"),
        (status = 500, description = "Internal error"),
    )
)]
pub async fn scrape(
    State(state): State<AppState>,
    ApiKeyId(api_key_id): ApiKeyId,
    Json(body): Json<ScrapeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.url.trim().is_empty() {
        return Err(ApiError::Validation("url must not be empty".to_string()));
    }
    let opts: ScrapeOptions = body.options.into();
    let outcome = run_scrape(&state.ctx, &api_key_id, &body.url, &opts).await?;
    Ok(Json(ScrapeResponse {
        success: true,
        data: outcome.page,
    }))
}
