//! Webhook subscription and delivery models.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{webhook_deliveries, webhook_subscriptions};

/// Event types a subscription can be notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ScrapeCreated,
    ScrapeStarted,
    ScrapeCompleted,
    ScrapeCancelled,
    CrawlCreated,
    CrawlStarted,
    CrawlPageSuccess,
    CrawlCompleted,
    CrawlCancelled,
    SearchCreated,
    SearchStarted,
    SearchCompleted,
    SearchCancelled,
    MapCreated,
    MapStarted,
    MapCompleted,
    MapCancelled,
    TaskCreated,
    TaskStarted,
    TaskCompleted,
    TaskCancelled,
    WebhookTest,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScrapeCreated => "scrape.created",
            Self::ScrapeStarted => "scrape.started",
            Self::ScrapeCompleted => "scrape.completed",
            Self::ScrapeCancelled => "scrape.cancelled",
            Self::CrawlCreated => "crawl.created",
            Self::CrawlStarted => "crawl.started",
            Self::CrawlPageSuccess => "crawl.page_success",
            Self::CrawlCompleted => "crawl.completed",
            Self::CrawlCancelled => "crawl.cancelled",
            Self::SearchCreated => "search.created",
            Self::SearchStarted => "search.started",
            Self::SearchCompleted => "search.completed",
            Self::SearchCancelled => "search.cancelled",
            Self::MapCreated => "map.created",
            Self::MapStarted => "map.started",
            Self::MapCompleted => "map.completed",
            Self::MapCancelled => "map.cancelled",
            Self::TaskCreated => "task.created",
            Self::TaskStarted => "task.started",
            Self::TaskCompleted => "task.completed",
            Self::TaskCancelled => "task.cancelled",
            Self::WebhookTest => "webhook.test",
        }
    }
}

/// Dual ownership: a subscription (or a job) is owned by an API key or a
/// user, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Owner {
    ApiKey(String),
    User(String),
}

/// Delivery scope: all subscribed event types for the owner, or only for a
/// named allowlist of resource (task) ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookScope {
    All,
    Specific,
}

impl WebhookScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Specific => "specific",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "specific" => Some(Self::Specific),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = webhook_subscriptions)]
pub struct WebhookSubscription {
    pub id: String,
    pub owner_api_key_id: Option<String>,
    pub owner_user_id: Option<String>,
    pub url: String,
    pub secret: String,
    pub scope: String,
    /// JSON array of event type strings.
    pub event_types: String,
    /// JSON array of allowed resource ids, when `scope == "specific"`.
    pub specific_task_ids: Option<String>,
    /// JSON object of extra headers to send with every delivery.
    pub custom_headers: String,
    pub timeout_ms: i32,
    pub max_retries: i32,
    pub backoff_multiplier: f64,
    pub is_active: bool,
    pub consecutive_failures: i32,
    /// JSON array of free-form tags.
    pub tags: String,
    /// JSON object of free-form metadata.
    pub metadata: String,
    pub created_at: String,
    pub updated_at: String,
}

impl WebhookSubscription {
    pub fn owner(&self) -> Option<Owner> {
        if let Some(id) = &self.owner_api_key_id {
            Some(Owner::ApiKey(id.clone()))
        } else {
            self.owner_user_id.clone().map(Owner::User)
        }
    }

    pub fn event_types(&self) -> Vec<String> {
        serde_json::from_str(&self.event_types).unwrap_or_default()
    }

    pub fn specific_task_ids(&self) -> Vec<String> {
        self.specific_task_ids
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default()
    }

    pub fn custom_headers(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::from_str(&self.custom_headers).unwrap_or_default()
    }

    /// Whether this subscription should receive `event_type` for the given
    /// `resource_id`, per §4.6's resolution algorithm.
    pub fn matches(&self, event_type: &str, resource_id: &str) -> bool {
        if !self.is_active {
            return false;
        }
        if !self.event_types().iter().any(|e| e == event_type) {
            return false;
        }
        match WebhookScope::from_str(&self.scope) {
            Some(WebhookScope::All) => true,
            Some(WebhookScope::Specific) => {
                self.specific_task_ids().iter().any(|id| id == resource_id)
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = webhook_subscriptions)]
pub struct NewWebhookSubscription {
    pub id: String,
    pub owner_api_key_id: Option<String>,
    pub owner_user_id: Option<String>,
    pub url: String,
    pub secret: String,
    pub scope: String,
    pub event_types: String,
    pub specific_task_ids: Option<String>,
    pub custom_headers: String,
    pub timeout_ms: i32,
    pub max_retries: i32,
    pub backoff_multiplier: f64,
    pub is_active: bool,
    pub consecutive_failures: i32,
    pub tags: String,
    pub metadata: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = webhook_deliveries)]
pub struct WebhookDelivery {
    pub id: String,
    pub subscription_id: String,
    pub event_type: String,
    pub payload: String,
    pub status: String,
    pub attempt_number: i32,
    pub next_retry_at: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = webhook_deliveries)]
pub struct NewWebhookDelivery {
    pub id: String,
    pub subscription_id: String,
    pub event_type: String,
    pub payload: String,
    pub status: String,
    pub attempt_number: i32,
    pub next_retry_at: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
