//! Staleness reaper (C5): a `task_executions` row stuck in `running` past
//! `stale_after` is reclaimed, failing the execution, the job, and bumping
//! the scheduled task's failure tally.

mod support;

use anycrawl_core::jobs::{create_job, get_job, mark_running};
use anycrawl_core::models::job::{JobKind, JobStatus};
use anycrawl_core::queue::DbQueue;
use anycrawl_core::reaper::reap_stale_executions;
use support::{seed_stale_execution, TestDb};

#[tokio::test]
async fn reaps_an_execution_stuck_running_past_stale_after() {
    let db = TestDb::new().await;
    let queue = DbQueue::new(db.pool.clone());

    let job = create_job(&db.pool, JobKind::Crawl, "crawl", "key-1", "https://example.com").await.unwrap();
    mark_running(&db.pool, &job.id).await.unwrap();
    seed_stale_execution(&db.pool, "sched-1", &job.id, std::time::Duration::from_secs(3600)).await;

    let reaped = reap_stale_executions(&db.pool, &queue, std::time::Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(reaped.len(), 1);
    assert_eq!(reaped[0].job_id, job.id);
    assert!(reaped[0].job_failed_here);

    let job = get_job(&db.pool, &job.id).await.unwrap().unwrap();
    assert_eq!(job.status(), JobStatus::Failed);
}

#[tokio::test]
async fn does_not_touch_executions_younger_than_stale_after() {
    let db = TestDb::new().await;
    let queue = DbQueue::new(db.pool.clone());

    let job = create_job(&db.pool, JobKind::Crawl, "crawl", "key-1", "https://example.com").await.unwrap();
    mark_running(&db.pool, &job.id).await.unwrap();
    seed_stale_execution(&db.pool, "sched-1", &job.id, std::time::Duration::from_secs(5)).await;

    let reaped = reap_stale_executions(&db.pool, &queue, std::time::Duration::from_secs(3600))
        .await
        .unwrap();

    assert!(reaped.is_empty());
    let job = get_job(&db.pool, &job.id).await.unwrap().unwrap();
    assert_eq!(job.status(), JobStatus::Running);
}

#[tokio::test]
async fn reaping_an_already_terminal_job_does_not_report_job_failed_here() {
    let db = TestDb::new().await;
    let queue = DbQueue::new(db.pool.clone());

    let job = create_job(&db.pool, JobKind::Crawl, "crawl", "key-1", "https://example.com").await.unwrap();
    mark_running(&db.pool, &job.id).await.unwrap();
    anycrawl_core::jobs::mark_completed(&db.pool, &job.id, None).await.unwrap();
    seed_stale_execution(&db.pool, "sched-1", &job.id, std::time::Duration::from_secs(3600)).await;

    let reaped = reap_stale_executions(&db.pool, &queue, std::time::Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(reaped.len(), 1);
    assert!(!reaped[0].job_failed_here);
    let job = get_job(&db.pool, &job.id).await.unwrap().unwrap();
    assert_eq!(job.status(), JobStatus::Completed);
}
