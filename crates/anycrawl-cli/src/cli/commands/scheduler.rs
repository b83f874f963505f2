//! Scheduler command: run the staleness reaper loop in the foreground.

use console::style;

use anycrawl_core::config::Settings;
use anycrawl_core::queue::DbQueue;
use anycrawl_core::reaper;

pub async fn run_scheduler(settings: Settings) -> anyhow::Result<()> {
    let pool = settings.create_db_pool()?;
    let queue = DbQueue::new(pool.clone());

    println!(
        "{} Scheduler running (interval {}s, stale-after {}s)",
        style("→").cyan(),
        settings.reaper_interval_secs,
        settings.reaper_stale_after_secs
    );

    reaper::run_forever(
        pool,
        queue,
        std::time::Duration::from_secs(settings.reaper_interval_secs),
        std::time::Duration::from_secs(settings.reaper_stale_after_secs),
    )
    .await;

    Ok(())
}
