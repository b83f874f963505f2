//! Billing ledger invariants (C2): CAS-guarded charges, idempotent
//! dedup, target-mode monotonicity, and admission pre-flight.

mod support;

use anycrawl_core::billing::{admit, charge_delta, charge_to_used, LedgerError};
use anycrawl_core::jobs::create_job;
use anycrawl_core::models::billing::ChargeDetails;
use anycrawl_core::models::job::JobKind;
use support::{api_key_credits, seed_api_key, TestDb};

fn empty_details() -> ChargeDetails {
    ChargeDetails::new("test", vec![])
}

#[tokio::test]
async fn admit_rejects_when_balance_is_below_estimate() {
    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 5).await;

    let err = admit(&db.pool, "key-1", 10).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientCredits { required: 10, available: 5, .. }));
}

#[tokio::test]
async fn admit_unknown_api_key_is_not_found() {
    let db = TestDb::new().await;
    let err = admit(&db.pool, "ghost", 1).await.unwrap_err();
    assert!(matches!(err, LedgerError::ApiKeyNotFound(id) if id == "ghost"));
}

#[tokio::test]
async fn charge_delta_debits_api_key_and_increments_job_used() {
    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let job = create_job(&db.pool, JobKind::Scrape, "scrape", "key-1", "https://example.com").await.unwrap();

    let outcome = charge_delta(&db.pool, &job.id, 7, "api_request_finalize", None, empty_details())
        .await
        .unwrap();

    assert_eq!(outcome.charged, 7);
    assert_eq!(outcome.before_used, 0);
    assert_eq!(outcome.after_used, 7);
    assert_eq!(api_key_credits(&db.pool, "key-1").await, 93);
}

#[tokio::test]
async fn charge_delta_with_idempotency_key_dedupes_on_retry() {
    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let job = create_job(&db.pool, JobKind::Scrape, "scrape", "key-1", "https://example.com").await.unwrap();

    let key = Some("retry-key-1".to_string());
    let first = charge_delta(&db.pool, &job.id, 10, "api_request_finalize", key.clone(), empty_details())
        .await
        .unwrap();
    let second = charge_delta(&db.pool, &job.id, 10, "api_request_finalize", key, empty_details())
        .await
        .unwrap();

    assert_eq!(first.charged, 10);
    assert_eq!(second.charged, 0, "retry with the same idempotency key must not double-charge");
    assert_eq!(api_key_credits(&db.pool, "key-1").await, 90);
}

#[tokio::test]
async fn charge_delta_non_positive_is_a_no_op() {
    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let job = create_job(&db.pool, JobKind::Scrape, "scrape", "key-1", "https://example.com").await.unwrap();

    let outcome = charge_delta(&db.pool, &job.id, 0, "noop", None, empty_details()).await.unwrap();
    assert_eq!(outcome.charged, 0);
    assert_eq!(api_key_credits(&db.pool, "key-1").await, 100);
}

#[tokio::test]
async fn charge_to_used_never_decreases_credits_used() {
    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let job = create_job(&db.pool, JobKind::Scrape, "scrape", "key-1", "https://example.com").await.unwrap();

    charge_to_used(&db.pool, &job.id, 20, "crawl_progress", None, empty_details()).await.unwrap();
    let second = charge_to_used(&db.pool, &job.id, 5, "crawl_progress", None, empty_details()).await.unwrap();

    assert_eq!(second.charged, 0);
    assert_eq!(second.after_used, 20);
    assert_eq!(api_key_credits(&db.pool, "key-1").await, 80);
}

#[tokio::test]
async fn charge_to_used_reusing_key_for_a_different_target_is_rejected() {
    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let job = create_job(&db.pool, JobKind::Scrape, "scrape", "key-1", "https://example.com").await.unwrap();

    let key = Some("target-key-1".to_string());
    charge_to_used(&db.pool, &job.id, 10, "crawl_progress", key.clone(), empty_details()).await.unwrap();
    let err = charge_to_used(&db.pool, &job.id, 15, "crawl_progress", key, empty_details())
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::DuplicateKey(_)));
}

#[tokio::test]
async fn charge_delta_against_unknown_job_is_not_found() {
    let db = TestDb::new().await;
    let err = charge_delta(&db.pool, "no-such-job", 1, "x", None, empty_details())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::JobNotFound(id) if id == "no-such-job"));
}
