//! Staleness reaper (C5): periodically reclaims `task_executions` whose
//! owning worker went silent, failing the execution, the scheduled task's
//! rollup counters, and (if it's still open) the underlying job.

use chrono::{Duration as ChronoDuration, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use thiserror::Error;

use crate::db::{DbError, DbPool};
use crate::jobs;
use crate::models::scheduler::ExecutionStatus;
use crate::queue::DbQueue;
use crate::schema::{scheduled_tasks, task_executions};
use crate::with_conn;

#[derive(Debug, Error)]
pub enum ReaperError {
    #[error("database error: {0}")]
    Database(#[from] DbError),
    #[error("job store error: {0}")]
    JobStore(#[from] jobs::JobStoreError),
    #[error("queue error: {0}")]
    Queue(#[from] crate::queue::QueueError),
}

/// A reaped execution, reported back for logging/metrics.
#[derive(Debug, Clone)]
pub struct ReapedExecution {
    pub task_execution_id: String,
    pub scheduled_task_id: String,
    pub job_id: String,
    /// Whether the job transition to `failed` was actually applied here
    /// (`false` when the job had already reached a terminal state through
    /// some other path, e.g. it was already completed or cancelled).
    pub job_failed_here: bool,
}

/// Scan for `task_executions` stuck in `running` past `stale_after` and
/// reclaim them. Returns one entry per execution reaped.
pub async fn reap_stale_executions(
    pool: &DbPool,
    queue: &DbQueue,
    stale_after: std::time::Duration,
) -> Result<Vec<ReapedExecution>, ReaperError> {
    let cutoff = (Utc::now()
        - ChronoDuration::from_std(stale_after).unwrap_or_else(|_| ChronoDuration::zero()))
    .to_rfc3339();

    let stale_ids: Vec<(String, String, String)> = with_conn!(pool, conn => {
        task_executions::table
            .filter(task_executions::status.eq(ExecutionStatus::Running.as_str()))
            .filter(task_executions::started_at.lt(&cutoff))
            .select((
                task_executions::id,
                task_executions::scheduled_task_id,
                task_executions::job_id,
            ))
            .load(&mut conn)
            .await?
    });

    let mut reaped = Vec::with_capacity(stale_ids.len());
    for (execution_id, scheduled_task_id, job_id) in stale_ids {
        let now = Utc::now().to_rfc3339();

        // Guard the execution transition the same way the job store guards
        // job transitions: only the writer that actually flips the row from
        // `running` gets to cascade the side effects.
        let rows = with_conn!(pool, conn => {
            diesel::update(
                task_executions::table
                    .filter(task_executions::id.eq(&execution_id))
                    .filter(task_executions::status.eq(ExecutionStatus::Running.as_str())),
            )
            .set((
                task_executions::status.eq(ExecutionStatus::Failed.as_str()),
                task_executions::finished_at.eq(Some(now.clone())),
                task_executions::reason.eq(Some("execution exceeded stale_after timeout".to_string())),
            ))
            .execute(&mut conn)
            .await?
        });
        if rows == 0 {
            continue;
        }

        with_conn!(pool, conn => {
            diesel::update(scheduled_tasks::table.filter(scheduled_tasks::id.eq(&scheduled_task_id)))
                .set((
                    scheduled_tasks::failed_executions.eq(scheduled_tasks::failed_executions + 1),
                    scheduled_tasks::updated_at.eq(now.clone()),
                ))
                .execute(&mut conn)
                .await?;
        });

        queue.cancel_job(&job_id).await?;

        // If the job was already terminal (completed, failed, or cancelled
        // via some other path before the reaper got here) leave it alone --
        // a job whose dispatch was never committed has no job row to fail
        // at all, which is simply the `NotFound` case below.
        let job_failed_here = match jobs::get_job(pool, &job_id).await? {
            Some(job) if !job.status().is_terminal() => {
                jobs::mark_failed(pool, &job_id, "reaped: execution exceeded stale_after timeout")
                    .await?;
                true
            }
            _ => false,
        };

        reaped.push(ReapedExecution {
            task_execution_id: execution_id,
            scheduled_task_id,
            job_id,
            job_failed_here,
        });
    }

    Ok(reaped)
}

/// Run `reap_stale_executions` on a fixed interval until the process exits.
/// Matches the worker/scheduler processes' long-running-task convention.
pub async fn run_forever(
    pool: DbPool,
    queue: DbQueue,
    interval: std::time::Duration,
    stale_after: std::time::Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match reap_stale_executions(&pool, &queue, stale_after).await {
            Ok(reaped) if !reaped.is_empty() => {
                tracing::info!(count = reaped.len(), "reaped stale task executions");
            }
            Ok(_) => {}
            Err(err) => tracing::error!(error = %err, "reaper pass failed"),
        }
    }
}
