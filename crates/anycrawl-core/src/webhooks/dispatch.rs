//! Subscription resolution and delivery dispatch (C6).

use chrono::{Duration as ChronoDuration, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::webhook::{
    DeliveryStatus, NewWebhookDelivery, Owner, WebhookDelivery, WebhookSubscription,
};
use crate::schema::{webhook_deliveries, webhook_subscriptions};
use crate::with_conn;

use super::error::WebhookError;
use super::signing::{sign, EVENT_HEADER, ID_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Resolve every active subscription that should receive `event_type` for
/// `resource_id`, scoped to `owner`. Scope/event filtering happens in-app
/// (`WebhookSubscription::matches`) since `event_types`/`specific_task_ids`
/// are stored as JSON text, not queryable columns.
pub async fn resolve_subscriptions(
    pool: &DbPool,
    owner: &Owner,
    event_type: &str,
    resource_id: &str,
) -> Result<Vec<WebhookSubscription>, WebhookError> {
    let rows: Vec<WebhookSubscription> = with_conn!(pool, conn => {
        let query = webhook_subscriptions::table.into_boxed();
        let query = match owner {
            Owner::ApiKey(id) => query.filter(webhook_subscriptions::owner_api_key_id.eq(id)),
            Owner::User(id) => query.filter(webhook_subscriptions::owner_user_id.eq(id)),
        };
        query
            .filter(webhook_subscriptions::is_active.eq(true))
            .select(WebhookSubscription::as_select())
            .load(&mut conn)
            .await?
    });

    Ok(rows
        .into_iter()
        .filter(|s| s.matches(event_type, resource_id))
        .collect())
}

/// Create a pending delivery row, scheduled to fire after
/// `initial_delay_secs`.
pub async fn create_delivery(
    pool: &DbPool,
    subscription_id: &str,
    event_type: &str,
    payload: &serde_json::Value,
    initial_delay_secs: i64,
) -> Result<WebhookDelivery, WebhookError> {
    let now = Utc::now();
    let row = NewWebhookDelivery {
        id: Uuid::new_v4().to_string(),
        subscription_id: subscription_id.to_string(),
        event_type: event_type.to_string(),
        payload: serde_json::to_string(payload)?,
        status: DeliveryStatus::Pending.as_str().to_string(),
        attempt_number: 1,
        next_retry_at: Some((now + ChronoDuration::seconds(initial_delay_secs)).to_rfc3339()),
        error_message: None,
        created_at: now.to_rfc3339(),
        updated_at: now.to_rfc3339(),
    };
    with_conn!(pool, conn => {
        diesel::insert_into(webhook_deliveries::table).values(&row).execute(&mut conn).await?;
    });
    get_delivery(pool, &row.id).await
}

/// Due pending deliveries (`next_retry_at <= now`), oldest first.
pub async fn due_deliveries(pool: &DbPool, limit: i64) -> Result<Vec<WebhookDelivery>, WebhookError> {
    let now_str = Utc::now().to_rfc3339();
    Ok(with_conn!(pool, conn => {
        webhook_deliveries::table
            .filter(webhook_deliveries::status.eq(DeliveryStatus::Pending.as_str()))
            .filter(webhook_deliveries::next_retry_at.le(&now_str))
            .order(webhook_deliveries::next_retry_at.asc())
            .limit(limit)
            .select(WebhookDelivery::as_select())
            .load(&mut conn)
            .await?
    }))
}

pub async fn get_subscription(
    pool: &DbPool,
    id: &str,
) -> Result<Option<WebhookSubscription>, WebhookError> {
    Ok(with_conn!(pool, conn => {
        webhook_subscriptions::table
            .filter(webhook_subscriptions::id.eq(id))
            .select(WebhookSubscription::as_select())
            .first(&mut conn)
            .await
            .optional()?
    }))
}

async fn get_delivery(pool: &DbPool, id: &str) -> Result<WebhookDelivery, WebhookError> {
    with_conn!(pool, conn => {
        webhook_deliveries::table
            .filter(webhook_deliveries::id.eq(id))
            .select(WebhookDelivery::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| WebhookError::DeliveryNotFound(id.to_string()))
    })
}

/// Attempt to deliver `delivery` to `subscription`'s URL. On success marks
/// the delivery `delivered`; on failure either schedules the next
/// exponential-backoff retry (`attempt_number + 1`, capped at
/// `max_retries`) or marks it terminally `failed` and bumps the
/// subscription's `consecutive_failures`.
pub async fn dispatch_one(
    pool: &DbPool,
    client: &reqwest::Client,
    delivery: &WebhookDelivery,
    subscription: &WebhookSubscription,
    initial_delay_secs: i64,
) -> Result<bool, WebhookError> {
    let timestamp = Utc::now().timestamp().to_string();
    let signature = sign(&subscription.secret, &timestamp, delivery.payload.as_bytes());

    let mut request = client
        .post(&subscription.url)
        .timeout(std::time::Duration::from_millis(subscription.timeout_ms as u64))
        .header(SIGNATURE_HEADER, signature)
        .header("Content-Type", "application/json")
        .header(EVENT_HEADER, &delivery.event_type)
        .header(ID_HEADER, &delivery.id)
        .header(TIMESTAMP_HEADER, &timestamp)
        .body(delivery.payload.clone());

    for (key, value) in subscription.custom_headers() {
        if let Some(value) = value.as_str() {
            request = request.header(key, value);
        }
    }

    let outcome = request.send().await;

    match outcome {
        Ok(response) if response.status().is_success() => {
            mark_delivered(pool, &delivery.id).await?;
            reset_consecutive_failures(pool, &subscription.id).await?;
            Ok(true)
        }
        Ok(response) => {
            let status = response.status().as_u16();
            handle_failure(
                pool,
                delivery,
                subscription,
                &format!("http status {status}"),
                initial_delay_secs,
            )
            .await?;
            Ok(false)
        }
        Err(err) => {
            handle_failure(pool, delivery, subscription, &err.to_string(), initial_delay_secs).await?;
            Ok(false)
        }
    }
}

async fn mark_delivered(pool: &DbPool, delivery_id: &str) -> Result<(), WebhookError> {
    with_conn!(pool, conn => {
        diesel::update(webhook_deliveries::table.filter(webhook_deliveries::id.eq(delivery_id)))
            .set((
                webhook_deliveries::status.eq(DeliveryStatus::Delivered.as_str()),
                webhook_deliveries::next_retry_at.eq(None::<String>),
                webhook_deliveries::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
    });
    Ok(())
}

async fn reset_consecutive_failures(pool: &DbPool, subscription_id: &str) -> Result<(), WebhookError> {
    with_conn!(pool, conn => {
        diesel::update(
            webhook_subscriptions::table.filter(webhook_subscriptions::id.eq(subscription_id)),
        )
        .set(webhook_subscriptions::consecutive_failures.eq(0))
        .execute(&mut conn)
        .await?;
    });
    Ok(())
}

async fn handle_failure(
    pool: &DbPool,
    delivery: &WebhookDelivery,
    subscription: &WebhookSubscription,
    error_message: &str,
    initial_delay_secs: i64,
) -> Result<(), WebhookError> {
    let next_attempt = delivery.attempt_number + 1;
    let now = Utc::now();

    if next_attempt > subscription.max_retries {
        with_conn!(pool, conn => {
            diesel::update(webhook_deliveries::table.filter(webhook_deliveries::id.eq(&delivery.id)))
                .set((
                    webhook_deliveries::status.eq(DeliveryStatus::Failed.as_str()),
                    webhook_deliveries::next_retry_at.eq(None::<String>),
                    webhook_deliveries::error_message.eq(Some(error_message.to_string())),
                    webhook_deliveries::updated_at.eq(now.to_rfc3339()),
                ))
                .execute(&mut conn)
                .await?;
        });
        with_conn!(pool, conn => {
            diesel::update(
                webhook_subscriptions::table.filter(webhook_subscriptions::id.eq(&subscription.id)),
            )
            .set(webhook_subscriptions::consecutive_failures.eq(webhook_subscriptions::consecutive_failures + 1))
            .execute(&mut conn)
            .await?;
        });
        return Ok(());
    }

    let backoff_secs = (initial_delay_secs.max(1) as f64
        * subscription.backoff_multiplier.powi(delivery.attempt_number - 1))
    .max(1.0) as i64;
    let next_retry_at = (now + ChronoDuration::seconds(backoff_secs)).to_rfc3339();

    with_conn!(pool, conn => {
        diesel::update(webhook_deliveries::table.filter(webhook_deliveries::id.eq(&delivery.id)))
            .set((
                webhook_deliveries::attempt_number.eq(next_attempt),
                webhook_deliveries::next_retry_at.eq(Some(next_retry_at)),
                webhook_deliveries::error_message.eq(Some(error_message.to_string())),
                webhook_deliveries::updated_at.eq(now.to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
    });
    Ok(())
}

/// Replay a delivery (terminally failed or not) by resetting it back to
/// `pending` with `attempt_number` reset to 1 and an immediate retry time.
pub async fn replay(pool: &DbPool, delivery_id: &str) -> Result<WebhookDelivery, WebhookError> {
    with_conn!(pool, conn => {
        diesel::update(webhook_deliveries::table.filter(webhook_deliveries::id.eq(delivery_id)))
            .set((
                webhook_deliveries::status.eq(DeliveryStatus::Pending.as_str()),
                webhook_deliveries::attempt_number.eq(1),
                webhook_deliveries::next_retry_at.eq(Some(Utc::now().to_rfc3339())),
                webhook_deliveries::error_message.eq(None::<String>),
                webhook_deliveries::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
    });
    get_delivery(pool, delivery_id).await
}
