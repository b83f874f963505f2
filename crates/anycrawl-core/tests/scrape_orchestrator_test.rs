//! `run_scrape` (C7) end to end: job lifecycle, cache lookup/store, and
//! billing, against a `wiremock` stand-in for the page being scraped.

mod support;

use std::sync::Arc;

use anycrawl_core::cache::{FsBlobStore, PageCache};
use anycrawl_core::config::Settings;
use anycrawl_core::models::job::JobStatus;
use anycrawl_core::orchestrators::context::OrchestratorContext;
use anycrawl_core::orchestrators::scrape::run_scrape;
use anycrawl_core::request::{Proxy, ScrapeOptions};
use support::{api_key_credits, job_count, latest_ledger_entry, seed_api_key, test_weights, TestDb};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> Settings {
    Settings {
        credit_weights: test_weights(),
        ..Settings::default()
    }
}

fn ctx_with_tempdir_cache(db: &TestDb, settings: Settings) -> OrchestratorContext {
    let cache_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsBlobStore::new(cache_dir.into_path()));
    let cache = Arc::new(PageCache::new(store, "cache/".to_string()));
    OrchestratorContext::build_default(db.pool.clone(), settings).with_cache(cache)
}

#[tokio::test]
async fn happy_scrape_charges_base_credits_and_completes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>hello</body></html>"))
        .mount(&server)
        .await;

    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let ctx = ctx_with_tempdir_cache(&db, settings());

    let url = format!("{}/page", server.uri());
    let outcome = run_scrape(&ctx, "key-1", &url, &ScrapeOptions::default()).await.unwrap();

    assert_eq!(outcome.job.status(), JobStatus::Completed);
    assert!(!outcome.cache_hit);
    assert_eq!(outcome.credits_charged, 1);
    assert_eq!(api_key_credits(&db.pool, "key-1").await, 99);

    let entry = latest_ledger_entry(&db.pool, &outcome.job.id).await;
    assert_eq!(entry.mode, "target");
    assert_eq!(entry.reason, "api_request_finalize");
    assert_eq!(entry.charged, 1);
}

#[tokio::test]
async fn second_identical_request_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>hello</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let ctx = ctx_with_tempdir_cache(&db, settings());
    let url = format!("{}/page", server.uri());

    let first = run_scrape(&ctx, "key-1", &url, &ScrapeOptions::default()).await.unwrap();
    let second = run_scrape(&ctx, "key-1", &url, &ScrapeOptions::default()).await.unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(second.job.cache_hits, 1);
    // the mock's `expect(1)` is verified on drop; a second live GET would panic here.
}

#[tokio::test]
async fn insufficient_credits_leaves_no_job_row_behind() {
    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 0).await;
    let ctx = ctx_with_tempdir_cache(&db, settings());

    let err = run_scrape(&ctx, "key-1", "https://example.com/unused", &ScrapeOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, anycrawl_core::orchestrators::error::OrchestratorError::Billing(_)));
    assert_eq!(job_count(&db.pool).await, 0);
    assert_eq!(api_key_credits(&db.pool, "key-1").await, 0);
}

#[tokio::test]
async fn stealth_proxy_adds_its_surcharge_to_the_charge() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let ctx = ctx_with_tempdir_cache(&db, settings());
    let url = format!("{}/page", server.uri());

    let opts = ScrapeOptions {
        proxy: Proxy::Stealth,
        ..ScrapeOptions::default()
    };
    let outcome = run_scrape(&ctx, "key-1", &url, &opts).await.unwrap();

    // base_scrape (1) + proxy_stealth (2) from `test_weights`.
    assert_eq!(outcome.credits_charged, 3);
}

#[tokio::test]
async fn adapter_failure_fails_the_job_without_charging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let ctx = ctx_with_tempdir_cache(&db, settings());
    let url = format!("{}/missing", server.uri());

    let err = run_scrape(&ctx, "key-1", &url, &ScrapeOptions::default()).await.unwrap_err();
    assert!(matches!(err, anycrawl_core::orchestrators::error::OrchestratorError::Adapter(_)));
    assert_eq!(api_key_credits(&db.pool, "key-1").await, 100);
}
