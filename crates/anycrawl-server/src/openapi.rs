//! OpenAPI spec generation and serving.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use utoipa::OpenApi;

use crate::dto;
use crate::error::ErrorEnvelope;
use crate::handlers::{crawl, health, map, scrape, search, webhooks};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AnyCrawl API",
        description = "Job lifecycle and billing core for scrape/crawl/search/map operations",
        version = "0.1.0"
    ),
    paths(
        health::health,
        scrape::scrape,
        crawl::create_crawl,
        crawl::get_crawl,
        crawl::get_crawl_results,
        map::map,
        search::search,
        webhooks::create,
        webhooks::list,
        webhooks::get,
        webhooks::patch,
        webhooks::delete,
        webhooks::activate,
        webhooks::deactivate,
        webhooks::test,
        webhooks::deliveries,
        webhooks::replay_delivery,
    ),
    components(schemas(
        ErrorEnvelope,
        dto::ScrapeOptionsDto,
        dto::ScrapeRequest,
        dto::ScrapeResponse,
        dto::CrawlRequest,
        dto::CrawlCreatedResponse,
        dto::JobStatusResponse,
        dto::CrawlResultsResponse,
        dto::MapRequest,
        dto::MapResultItem,
        dto::MapResponse,
        dto::SearchRequest,
        dto::SearchResponse,
        dto::CreateWebhookRequest,
        dto::PatchWebhookRequest,
        dto::WebhookSubscriptionResponse,
        dto::WebhookSubscriptionCreatedResponse,
        dto::WebhookDeliveryResponse,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "scrape", description = "Single-page scrape"),
        (name = "crawl", description = "Multi-page crawl jobs"),
        (name = "map", description = "Site URL discovery"),
        (name = "search", description = "Search and scrape results"),
        (name = "webhooks", description = "Webhook subscriptions and delivery history"),
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI spec as JSON.
pub async fn openapi_spec() -> impl IntoResponse {
    let spec = ApiDoc::openapi()
        .to_json()
        .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
    (StatusCode::OK, [("content-type", "application/json")], spec)
}
