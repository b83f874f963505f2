//! Webhook delivery management commands.

use console::style;

use anycrawl_core::config::Settings;
use anycrawl_core::webhooks;

pub async fn run_webhook_dispatch(settings: Settings) -> anyhow::Result<()> {
    let pool = settings.create_db_pool()?;
    println!(
        "{} Webhook dispatch loop running (interval {}s)",
        style("→").cyan(),
        settings.webhook_dispatch_interval_secs
    );
    webhooks::run_forever(
        pool,
        std::time::Duration::from_secs(settings.webhook_dispatch_interval_secs),
        settings.webhook_initial_delay_secs as i64,
    )
    .await;
    Ok(())
}

pub async fn list_deliveries(
    settings: Settings,
    subscription_id: &str,
    status: Option<&str>,
) -> anyhow::Result<()> {
    let pool = settings.create_db_pool()?;
    let deliveries = webhooks::list_deliveries(&pool, subscription_id, status, 50).await?;

    if deliveries.is_empty() {
        println!("{} No deliveries found", style("!").yellow());
        return Ok(());
    }

    println!("{:<38} {:<22} {:<10} attempt", "id", "event_type", "status");
    for delivery in deliveries {
        println!(
            "{:<38} {:<22} {:<10} {}",
            delivery.id, delivery.event_type, delivery.status, delivery.attempt_number
        );
    }
    Ok(())
}

pub async fn replay_delivery(settings: Settings, delivery_id: &str) -> anyhow::Result<()> {
    let pool = settings.create_db_pool()?;
    let delivery = webhooks::replay(&pool, delivery_id).await?;
    println!(
        "{} Requeued delivery {} (attempt reset to {})",
        style("✓").green(),
        delivery.id,
        delivery.attempt_number
    );
    Ok(())
}
