use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use anycrawl_core::jobs;
use anycrawl_core::orchestrators::run_crawl;
use anycrawl_core::request::ScrapeOptions;

use crate::dto::{CrawlCreatedResponse, CrawlRequest, CrawlResultsResponse, JobStatusResponse, PageQuery};
use crate::error::ApiError;
use crate::extractors::ApiKeyId;
use crate::state::AppState;

const DEFAULT_PAGE_LIMIT: usize = 100;
const DEFAULT_PER_PAGE: usize = 20;

#[utoipa::path(
    post,
    path = "/v1/crawl",
    tag = "crawl",
    request_body = CrawlRequest,
    responses(
        (status = 200, description = "Crawl job created", body = CrawlCreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 402, description = "Insufficient credits"),
        (status = 500, description = "Internal error"),
    )
)]
pub async fn create_crawl(
    State(state): State<AppState>,
    ApiKeyId(api_key_id): ApiKeyId,
    Json(body): Json<CrawlRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.url.trim().is_empty() {
        return Err(ApiError::Validation("url must not be empty".to_string()));
    }
    let opts: ScrapeOptions = body.options.into();
    let page_limit = body.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let outcome = run_crawl(&state.ctx, &api_key_id, &body.url, &opts, page_limit).await?;
    Ok(Json(CrawlCreatedResponse {
        job_id: outcome.job.id,
        status: outcome.job.status,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/crawl/{id}",
    tag = "crawl",
    params(("id" = String, Path, description = "Crawl job id")),
    responses(
        (status = 200, description = "Job status", body = JobStatusResponse),
        (status = 404, description = "Job not found"),
    )
)]
pub async fn get_crawl(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job = jobs::get_job(&state.ctx.pool, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {id} not found")))?;
    Ok(Json(JobStatusResponse::from(&job)))
}

#[utoipa::path(
    get,
    path = "/v1/crawl/{id}/results",
    tag = "crawl",
    params(
        ("id" = String, Path, description = "Crawl job id"),
        ("page" = Option<usize>, Query),
        ("per_page" = Option<usize>, Query),
    ),
    responses(
        (status = 200, description = "Crawl page results", body = CrawlResultsResponse),
        (status = 404, description = "Job not found"),
    )
)]
pub async fn get_crawl_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let job = jobs::get_job(&state.ctx.pool, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {id} not found")))?;

    let all_pages: Vec<serde_json::Value> = job
        .result_blob
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?
        .unwrap_or_default();

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1);
    let start = (page - 1) * per_page;
    let data = all_pages
        .iter()
        .skip(start)
        .take(per_page)
        .cloned()
        .collect();

    Ok(Json(CrawlResultsResponse {
        job_id: job.id,
        status: job.status,
        page,
        per_page,
        total: all_pages.len(),
        data,
    }))
}
