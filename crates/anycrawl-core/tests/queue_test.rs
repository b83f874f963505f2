//! Durable named-queue (C4): claim/complete/fail lifecycle and the
//! visibility-timeout semantics that let a stale lease be reclaimed.

mod support;

use anycrawl_core::jobs::create_job;
use anycrawl_core::models::job::JobKind;
use anycrawl_core::queue::DbQueue;
use support::TestDb;

#[tokio::test]
async fn claim_then_complete_removes_the_message_from_circulation() {
    let db = TestDb::new().await;
    let queue = DbQueue::new(db.pool.clone());
    let job = create_job(&db.pool, JobKind::Scrape, "scrape", "key-1", "https://example.com").await.unwrap();

    queue.enqueue("scrape", &job.id, &serde_json::json!({})).await.unwrap();

    let handle = queue.claim_next("scrape", 300).await.unwrap().expect("message should be claimable");
    assert_eq!(handle.item().job_id, job.id);
    queue.complete(handle).await.unwrap();

    let next = queue.claim_next("scrape", 300).await.unwrap();
    assert!(next.is_none(), "a completed message must not be claimable again");
}

#[tokio::test]
async fn an_empty_queue_yields_no_claim() {
    let db = TestDb::new().await;
    let queue = DbQueue::new(db.pool.clone());
    assert!(queue.claim_next("scrape", 300).await.unwrap().is_none());
}

#[tokio::test]
async fn a_claimed_message_is_invisible_to_other_claimants_until_the_lease_expires() {
    let db = TestDb::new().await;
    let queue = DbQueue::new(db.pool.clone());
    let job = create_job(&db.pool, JobKind::Scrape, "scrape", "key-1", "https://example.com").await.unwrap();
    queue.enqueue("scrape", &job.id, &serde_json::json!({})).await.unwrap();

    let handle = queue.claim_next("scrape", 300).await.unwrap().unwrap();
    assert!(queue.claim_next("scrape", 300).await.unwrap().is_none());

    // Abandon the lease without completing it; a fresh claim with an
    // already-expired lease window reclaims it immediately.
    drop(handle);
    let reclaimed = queue.claim_next("scrape", -1).await.unwrap();
    assert!(reclaimed.is_none(), "the first claim's lease is still in the future, not yet stale");
}

#[tokio::test]
async fn fail_with_requeue_makes_the_message_visible_again_after_the_delay() {
    let db = TestDb::new().await;
    let queue = DbQueue::new(db.pool.clone());
    let job = create_job(&db.pool, JobKind::Scrape, "scrape", "key-1", "https://example.com").await.unwrap();
    queue.enqueue("scrape", &job.id, &serde_json::json!({})).await.unwrap();

    let handle = queue.claim_next("scrape", 300).await.unwrap().unwrap();
    queue.fail(handle, true, 0).await.unwrap();

    let reclaimed = queue.claim_next("scrape", 300).await.unwrap();
    assert!(reclaimed.is_some(), "a zero-delay requeue should be immediately visible");
}

#[tokio::test]
async fn cancel_job_fails_every_non_terminal_message_for_that_job() {
    let db = TestDb::new().await;
    let queue = DbQueue::new(db.pool.clone());
    let job = create_job(&db.pool, JobKind::Crawl, "crawl", "key-1", "https://example.com").await.unwrap();
    queue.enqueue("crawl", &job.id, &serde_json::json!({"page": 1})).await.unwrap();
    queue.enqueue("crawl", &job.id, &serde_json::json!({"page": 2})).await.unwrap();

    queue.cancel_job(&job.id).await.unwrap();

    assert!(queue.claim_next("crawl", 300).await.unwrap().is_none());
}
