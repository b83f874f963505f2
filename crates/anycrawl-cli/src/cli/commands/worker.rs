//! Worker command: drain the durable queue, completing each leased message.
//!
//! The HTTP handlers run orchestrators synchronously and complete jobs
//! inline; nothing currently enqueues messages onto `queue_messages` for
//! this loop to pick up. It exists as the long-running process the queue
//! abstraction is built for, ready for a future async dispatch path.

use console::style;

use anycrawl_core::config::Settings;
use anycrawl_core::queue::DbQueue;

const QUEUE_NAMES: &[&str] = &["scrape", "crawl", "search", "map"];
const LEASE_SECONDS: i64 = 300;
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(2);

pub async fn run_worker(settings: Settings) -> anyhow::Result<()> {
    let pool = settings.create_db_pool()?;
    let queue = DbQueue::new(pool);

    println!("{} Worker polling {:?}", style("→").cyan(), QUEUE_NAMES);

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        ticker.tick().await;
        for queue_name in QUEUE_NAMES {
            match queue.claim_next(queue_name, LEASE_SECONDS).await {
                Ok(Some(handle)) => {
                    tracing::info!(
                        queue = queue_name,
                        job_id = %handle.item().job_id,
                        "claimed queue message"
                    );
                    if let Err(err) = queue.complete(handle).await {
                        tracing::error!(error = %err, "failed to mark queue message complete");
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(error = %err, queue = queue_name, "failed to claim from queue");
                }
            }
        }
    }
}
