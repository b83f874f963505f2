//! Webhook subscription resolution and delivery (C6).

pub mod dispatch;
pub mod error;
pub mod events;
pub mod signing;
pub mod subscriptions;

pub use dispatch::{
    create_delivery, dispatch_one, due_deliveries, get_subscription, replay, resolve_subscriptions,
};
pub use error::WebhookError;
pub use events::fire_event;
pub use subscriptions::{
    create_subscription, delete_subscription, list_deliveries, list_subscriptions, set_active,
    update_subscription, NewSubscriptionInput, SubscriptionPatch,
};

use crate::db::DbPool;

/// Poll `due_deliveries` and dispatch each on a fixed interval, until the
/// process exits. Matches the worker/reaper processes' long-running-task
/// convention. `initial_delay_secs` is the base of the retry backoff
/// (§4.6: `initial_delay × multiplier^(attempt_number-1)`).
pub async fn run_forever(pool: DbPool, interval: std::time::Duration, initial_delay_secs: i64) {
    let client = reqwest::Client::new();
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let due = match dispatch::due_deliveries(&pool, 50).await {
            Ok(due) => due,
            Err(err) => {
                tracing::error!(error = %err, "failed to list due webhook deliveries");
                continue;
            }
        };
        for delivery in due {
            let subscription = match dispatch::get_subscription(&pool, &delivery.subscription_id).await
            {
                Ok(Some(s)) => s,
                Ok(None) => continue,
                Err(err) => {
                    tracing::error!(error = %err, "failed to load webhook subscription");
                    continue;
                }
            };
            if let Err(err) =
                dispatch::dispatch_one(&pool, &client, &delivery, &subscription, initial_delay_secs).await
            {
                tracing::error!(error = %err, delivery_id = %delivery.id, "webhook dispatch failed");
            }
        }
    }
}
