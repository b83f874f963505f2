use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use anycrawl_core::orchestrators::run_search;
use anycrawl_core::request::ScrapeOptions;

use crate::dto::{SearchRequest, SearchResponse};
use crate::error::ApiError;
use crate::extractors::ApiKeyId;
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 10;

#[utoipa::path(
    post,
    path = "/v1/search",
    tag = "search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "Validation error"),
        (status = 402, description = "Insufficient credits"),
        (status = 500, description = "Internal error"),
    )
)]
pub async fn search(
    State(state): State<AppState>,
    ApiKeyId(api_key_id): ApiKeyId,
    Json(body): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.query.trim().is_empty() {
        return Err(ApiError::Validation("query must not be empty".to_string()));
    }
    let opts: ScrapeOptions = body.scrape_options.unwrap_or_default().into();
    let limit = body.limit.unwrap_or(DEFAULT_LIMIT);
    let outcome = run_search(&state.ctx, &api_key_id, &body.query, &opts, limit).await?;
    Ok(Json(SearchResponse {
        success: true,
        data: outcome.results,
    }))
}
