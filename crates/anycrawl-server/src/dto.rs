//! HTTP-layer request/response shapes.
//!
//! Per the design notes, dynamic option objects are tagged variants with an
//! options sub-record; snake/camel coercion and enum parsing happen once
//! here, at ingress, so the core crate's `ScrapeOptions` never has to know
//! about JSON wire formats. The API accepts snake_case only (§6): extra
//! camelCase keys are silently ignored by serde's default behavior rather
//! than rejected or special-cased.

use anycrawl_core::models::job::Job;
use anycrawl_core::models::webhook::WebhookSubscription;
use anycrawl_core::request::{ExtractSource, Proxy, ScrapeOptions};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(default)]
pub struct ScrapeOptionsDto {
    pub engine: String,
    pub formats: Vec<String>,
    pub json_options: Option<serde_json::Value>,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    pub only_main_content: bool,
    /// `"markdown"` (default) or `"html"`.
    pub extract_source: String,
    pub ocr_options: bool,
    pub wait_for: Option<u64>,
    pub wait_until: Option<String>,
    pub wait_for_selector: Option<serde_json::Value>,
    /// `"none"` (default) / `"auto"` / `"base"` / `"stealth"` / a raw proxy URL.
    pub proxy: String,
    pub custom_headers: serde_json::Map<String, serde_json::Value>,
    pub actions: Vec<serde_json::Value>,
    pub template: Option<String>,
    pub max_age: Option<u64>,
}

impl Default for ScrapeOptionsDto {
    fn default() -> Self {
        let opts = ScrapeOptions::default();
        Self {
            engine: opts.engine,
            formats: opts.formats,
            json_options: opts.json_options,
            include_tags: opts.include_tags,
            exclude_tags: opts.exclude_tags,
            only_main_content: opts.only_main_content,
            extract_source: "markdown".to_string(),
            ocr_options: opts.ocr_options,
            wait_for: opts.wait_for,
            wait_until: opts.wait_until,
            wait_for_selector: opts.wait_for_selector,
            proxy: "none".to_string(),
            custom_headers: opts.custom_headers,
            actions: opts.actions,
            template: opts.template,
            max_age: opts.max_age,
        }
    }
}

impl From<ScrapeOptionsDto> for ScrapeOptions {
    fn from(dto: ScrapeOptionsDto) -> Self {
        let proxy = match dto.proxy.as_str() {
            "none" | "" => Proxy::None,
            "auto" => Proxy::Auto,
            "base" => Proxy::Base,
            "stealth" => Proxy::Stealth,
            other => Proxy::Custom(other.to_string()),
        };
        let extract_source = match dto.extract_source.as_str() {
            "html" => ExtractSource::Html,
            _ => ExtractSource::Markdown,
        };
        ScrapeOptions {
            engine: dto.engine,
            formats: dto.formats,
            json_options: dto.json_options,
            include_tags: dto.include_tags,
            exclude_tags: dto.exclude_tags,
            only_main_content: dto.only_main_content,
            extract_source,
            ocr_options: dto.ocr_options,
            wait_for: dto.wait_for,
            wait_until: dto.wait_until,
            wait_for_selector: dto.wait_for_selector,
            proxy,
            custom_headers: dto.custom_headers,
            actions: dto.actions,
            template: dto.template,
            max_age: dto.max_age,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScrapeRequest {
    pub url: String,
    #[serde(flatten)]
    pub options: ScrapeOptionsDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScrapeResponse {
    pub success: bool,
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CrawlRequest {
    pub url: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(flatten)]
    pub options: ScrapeOptionsDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CrawlCreatedResponse {
    pub job_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub kind: String,
    pub status: String,
    pub total_count: i32,
    pub completed_count: i32,
    pub failed_count: i32,
    pub credits_used: i64,
    pub cache_hits: i32,
    pub failure_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            kind: job.kind.clone(),
            status: job.status.clone(),
            total_count: job.total_count,
            completed_count: job.completed_count,
            failed_count: job.failed_count,
            credits_used: job.credits_used,
            cache_hits: job.cache_hits,
            failure_message: job.failure_message.clone(),
            created_at: job.created_at.clone(),
            updated_at: job.updated_at.clone(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CrawlResultsResponse {
    pub job_id: String,
    pub status: String,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub data: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MapRequest {
    pub url: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_subdomains: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MapResultItem {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MapResponse {
    pub data: Vec<MapResultItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub scrape_options: Option<ScrapeOptionsDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub success: bool,
    pub data: Vec<serde_json::Value>,
}

// --- Webhooks -------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWebhookRequest {
    pub url: String,
    pub event_types: Vec<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub specific_task_ids: Vec<String>,
    #[serde(default)]
    pub custom_headers: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub timeout_ms: Option<i32>,
    #[serde(default)]
    pub max_retries: Option<i32>,
    #[serde(default)]
    pub backoff_multiplier: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PatchWebhookRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub event_types: Option<Vec<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub max_retries: Option<i32>,
    #[serde(default)]
    pub timeout_ms: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookSubscriptionResponse {
    pub id: String,
    pub url: String,
    pub scope: String,
    pub event_types: Vec<String>,
    pub specific_task_ids: Vec<String>,
    pub is_active: bool,
    pub max_retries: i32,
    pub timeout_ms: i32,
    pub backoff_multiplier: f64,
    pub consecutive_failures: i32,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&WebhookSubscription> for WebhookSubscriptionResponse {
    fn from(sub: &WebhookSubscription) -> Self {
        Self {
            id: sub.id.clone(),
            url: sub.url.clone(),
            scope: sub.scope.clone(),
            event_types: sub.event_types(),
            specific_task_ids: sub.specific_task_ids(),
            is_active: sub.is_active,
            max_retries: sub.max_retries,
            timeout_ms: sub.timeout_ms,
            backoff_multiplier: sub.backoff_multiplier,
            consecutive_failures: sub.consecutive_failures,
            tags: serde_json::from_str(&sub.tags).unwrap_or_default(),
            created_at: sub.created_at.clone(),
            updated_at: sub.updated_at.clone(),
        }
    }
}

/// Only ever returned once, from `POST /v1/webhooks` — the secret is never
/// echoed back by any other endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookSubscriptionCreatedResponse {
    #[serde(flatten)]
    pub subscription: WebhookSubscriptionResponse,
    pub secret: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookDeliveryResponse {
    pub id: String,
    pub subscription_id: String,
    pub event_type: String,
    pub status: String,
    pub attempt_number: i32,
    pub next_retry_at: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&anycrawl_core::models::webhook::WebhookDelivery> for WebhookDeliveryResponse {
    fn from(d: &anycrawl_core::models::webhook::WebhookDelivery) -> Self {
        Self {
            id: d.id.clone(),
            subscription_id: d.subscription_id.clone(),
            event_type: d.event_type.clone(),
            status: d.status.clone(),
            attempt_number: d.attempt_number,
            next_retry_at: d.next_retry_at.clone(),
            error_message: d.error_message.clone(),
            created_at: d.created_at.clone(),
            updated_at: d.updated_at.clone(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListDeliveriesQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}
