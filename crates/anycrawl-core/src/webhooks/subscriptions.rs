//! Webhook subscription CRUD and lifecycle (create/list/get/update/delete,
//! activate/deactivate).

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use rand::RngCore;
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::webhook::{NewWebhookSubscription, Owner, WebhookSubscription};
use crate::schema::webhook_subscriptions;
use crate::with_conn;

use super::error::WebhookError;

/// Input for creating a subscription. `event_types`/`specific_task_ids`/
/// `custom_headers`/`tags`/`metadata` are validated JSON-able values at the
/// HTTP ingress; this layer only serializes them.
pub struct NewSubscriptionInput {
    pub owner: Owner,
    pub url: String,
    pub scope: crate::models::webhook::WebhookScope,
    pub event_types: Vec<String>,
    pub specific_task_ids: Vec<String>,
    pub custom_headers: serde_json::Map<String, serde_json::Value>,
    pub timeout_ms: i32,
    pub max_retries: i32,
    pub backoff_multiplier: f64,
    pub tags: Vec<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Generate a random 32-byte hex secret, shown to the caller only once (at
/// creation time) -- `WebhookSubscription::secret` is never echoed back by
/// any other endpoint.
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn create_subscription(
    pool: &DbPool,
    input: NewSubscriptionInput,
) -> Result<WebhookSubscription, WebhookError> {
    let now = Utc::now().to_rfc3339();
    let (owner_api_key_id, owner_user_id) = match input.owner {
        Owner::ApiKey(id) => (Some(id), None),
        Owner::User(id) => (None, Some(id)),
    };
    let row = NewWebhookSubscription {
        id: Uuid::new_v4().to_string(),
        owner_api_key_id,
        owner_user_id,
        url: input.url,
        secret: generate_secret(),
        scope: input.scope.as_str().to_string(),
        event_types: serde_json::to_string(&input.event_types)?,
        specific_task_ids: if input.specific_task_ids.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&input.specific_task_ids)?)
        },
        custom_headers: serde_json::to_string(&input.custom_headers)?,
        timeout_ms: input.timeout_ms,
        max_retries: input.max_retries,
        backoff_multiplier: input.backoff_multiplier,
        is_active: true,
        consecutive_failures: 0,
        tags: serde_json::to_string(&input.tags)?,
        metadata: serde_json::to_string(&input.metadata)?,
        created_at: now.clone(),
        updated_at: now,
    };
    with_conn!(pool, conn => {
        diesel::insert_into(webhook_subscriptions::table).values(&row).execute(&mut conn).await?;
    });
    get_subscription_or_404(pool, &row.id).await
}

pub async fn list_subscriptions(
    pool: &DbPool,
    owner: &Owner,
) -> Result<Vec<WebhookSubscription>, WebhookError> {
    Ok(with_conn!(pool, conn => {
        let query = webhook_subscriptions::table.into_boxed();
        let query = match owner {
            Owner::ApiKey(id) => query.filter(webhook_subscriptions::owner_api_key_id.eq(id)),
            Owner::User(id) => query.filter(webhook_subscriptions::owner_user_id.eq(id)),
        };
        query
            .order(webhook_subscriptions::created_at.desc())
            .select(WebhookSubscription::as_select())
            .load(&mut conn)
            .await?
    }))
}

pub async fn get_subscription_or_404(
    pool: &DbPool,
    id: &str,
) -> Result<WebhookSubscription, WebhookError> {
    super::dispatch::get_subscription(pool, id)
        .await?
        .ok_or_else(|| WebhookError::SubscriptionNotFound(id.to_string()))
}

/// Patchable fields. `None` leaves the column untouched.
#[derive(Default)]
pub struct SubscriptionPatch {
    pub url: Option<String>,
    pub event_types: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub max_retries: Option<i32>,
    pub timeout_ms: Option<i32>,
}

pub async fn update_subscription(
    pool: &DbPool,
    id: &str,
    patch: SubscriptionPatch,
) -> Result<WebhookSubscription, WebhookError> {
    let existing = get_subscription_or_404(pool, id).await?;
    let url = patch.url.unwrap_or(existing.url);
    let event_types = match patch.event_types {
        Some(types) => serde_json::to_string(&types)?,
        None => existing.event_types,
    };
    let is_active = patch.is_active.unwrap_or(existing.is_active);
    let max_retries = patch.max_retries.unwrap_or(existing.max_retries);
    let timeout_ms = patch.timeout_ms.unwrap_or(existing.timeout_ms);

    with_conn!(pool, conn => {
        diesel::update(webhook_subscriptions::table.filter(webhook_subscriptions::id.eq(id)))
            .set((
                webhook_subscriptions::url.eq(url),
                webhook_subscriptions::event_types.eq(event_types),
                webhook_subscriptions::is_active.eq(is_active),
                webhook_subscriptions::max_retries.eq(max_retries),
                webhook_subscriptions::timeout_ms.eq(timeout_ms),
                webhook_subscriptions::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
    });
    get_subscription_or_404(pool, id).await
}

pub async fn set_active(
    pool: &DbPool,
    id: &str,
    active: bool,
) -> Result<WebhookSubscription, WebhookError> {
    with_conn!(pool, conn => {
        diesel::update(webhook_subscriptions::table.filter(webhook_subscriptions::id.eq(id)))
            .set((
                webhook_subscriptions::is_active.eq(active),
                webhook_subscriptions::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
    });
    get_subscription_or_404(pool, id).await
}

pub async fn delete_subscription(pool: &DbPool, id: &str) -> Result<(), WebhookError> {
    let rows = with_conn!(pool, conn => {
        diesel::delete(webhook_subscriptions::table.filter(webhook_subscriptions::id.eq(id)))
            .execute(&mut conn)
            .await?
    });
    if rows == 0 {
        return Err(WebhookError::SubscriptionNotFound(id.to_string()));
    }
    Ok(())
}

pub async fn list_deliveries(
    pool: &DbPool,
    subscription_id: &str,
    status: Option<&str>,
    limit: i64,
) -> Result<Vec<crate::models::webhook::WebhookDelivery>, WebhookError> {
    use crate::models::webhook::WebhookDelivery;
    use crate::schema::webhook_deliveries;

    Ok(with_conn!(pool, conn => {
        let query = webhook_deliveries::table
            .filter(webhook_deliveries::subscription_id.eq(subscription_id))
            .into_boxed();
        let query = match status {
            Some(status) => query.filter(webhook_deliveries::status.eq(status.to_string())),
            None => query,
        };
        query
            .order(webhook_deliveries::created_at.desc())
            .limit(limit)
            .select(WebhookDelivery::as_select())
            .load(&mut conn)
            .await?
    }))
}
