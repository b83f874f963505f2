//! Orchestrator-facing helper: resolve subscriptions for a lifecycle event
//! and create a pending delivery row for each match. The actual HTTP POST
//! is made later by `run_forever`'s dispatch loop, not here.

use crate::db::DbPool;
use crate::models::job::Job;
use crate::models::webhook::Owner;

use super::dispatch::{create_delivery, resolve_subscriptions};
use super::error::WebhookError;

/// Fire `event_type` for `job`, merging `extra` fields into the standard
/// `{job_id, status}` payload. A no-op (not an error) when no subscription
/// matches.
pub async fn fire_event(
    pool: &DbPool,
    owner: &Owner,
    event_type: &str,
    job: &Job,
    extra: serde_json::Value,
    initial_delay_secs: i64,
) -> Result<(), WebhookError> {
    let subscriptions = resolve_subscriptions(pool, owner, event_type, &job.id).await?;
    if subscriptions.is_empty() {
        return Ok(());
    }

    let mut payload = serde_json::json!({ "job_id": job.id, "status": job.status });
    if let (serde_json::Value::Object(base), serde_json::Value::Object(extra)) =
        (&mut payload, extra)
    {
        base.extend(extra);
    }

    for subscription in subscriptions {
        create_delivery(pool, &subscription.id, event_type, &payload, initial_delay_secs).await?;
    }
    Ok(())
}
