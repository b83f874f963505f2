//! `run_crawl` (C7): breadth-first page discovery, per-page billing, and
//! the job's running `completed_count`/`total_count` tallies.

mod support;

use std::sync::Arc;

use anycrawl_core::cache::{FsBlobStore, PageCache};
use anycrawl_core::config::Settings;
use anycrawl_core::models::job::JobStatus;
use anycrawl_core::orchestrators::context::OrchestratorContext;
use anycrawl_core::orchestrators::crawl::run_crawl;
use anycrawl_core::request::ScrapeOptions;
use support::{api_key_credits, ledger_entries_for_job, seed_api_key, test_weights, TestDb};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> Settings {
    Settings {
        credit_weights: test_weights(),
        ..Settings::default()
    }
}

fn ctx(db: &TestDb, settings: Settings) -> OrchestratorContext {
    let cache_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsBlobStore::new(cache_dir.into_path()));
    let cache = Arc::new(PageCache::new(store, "cache/".to_string()));
    OrchestratorContext::build_default(db.pool.clone(), settings).with_cache(cache)
}

#[tokio::test]
async fn crawl_follows_links_and_increments_completed_count_per_page() {
    let server = MockServer::start().await;
    let root_html = format!(
        "<html><body><a href=\"{}/b\">b</a></body></html>",
        server.uri()
    );
    Mock::given(method("GET")).and(path("/a")).respond_with(
        ResponseTemplate::new(200).set_body_string(root_html),
    ).mount(&server).await;
    Mock::given(method("GET")).and(path("/b")).respond_with(
        ResponseTemplate::new(200).set_body_string("<html><body>leaf</body></html>"),
    ).mount(&server).await;

    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let ctx = ctx(&db, settings());

    let start = format!("{}/a", server.uri());
    let outcome = run_crawl(&ctx, "key-1", &start, &ScrapeOptions::default(), 10).await.unwrap();

    assert_eq!(outcome.job.status(), JobStatus::Completed);
    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.job.completed_count, 2);
    // 2 pages * base_scrape (1) from `test_weights`; the first page is
    // billed as the crawl's initial charge, not a separate template fee.
    assert_eq!(outcome.credits_charged, 2);
    assert_eq!(api_key_credits(&db.pool, "key-1").await, 98);

    let entries = ledger_entries_for_job(&db.pool, &outcome.job.id).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].reason, "api_crawl_initial");
    assert_eq!(entries[1].reason, "crawl_page_v1");
}

#[tokio::test]
async fn crawl_bills_exactly_one_initial_charge_and_one_row_per_subsequent_page() {
    let server = MockServer::start().await;
    let root_html = format!(
        "<html><body><a href=\"{0}/b\">b</a><a href=\"{0}/c\">c</a></body></html>",
        server.uri()
    );
    Mock::given(method("GET")).and(path("/a")).respond_with(
        ResponseTemplate::new(200).set_body_string(root_html),
    ).mount(&server).await;
    Mock::given(method("GET")).and(path("/b")).respond_with(
        ResponseTemplate::new(200).set_body_string("<html></html>"),
    ).mount(&server).await;
    Mock::given(method("GET")).and(path("/c")).respond_with(
        ResponseTemplate::new(200).set_body_string("<html></html>"),
    ).mount(&server).await;

    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let ctx = ctx(&db, settings());

    let start = format!("{}/a", server.uri());
    let outcome = run_crawl(&ctx, "key-1", &start, &ScrapeOptions::default(), 3).await.unwrap();

    assert_eq!(outcome.pages.len(), 3);
    assert_eq!(outcome.job.credits_used, 3);

    let entries = ledger_entries_for_job(&db.pool, &outcome.job.id).await;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].reason, "api_crawl_initial");
    assert_eq!(entries[1].reason, "crawl_page_v1");
    assert_eq!(entries[2].reason, "crawl_page_v1");
}

#[tokio::test]
async fn crawl_stops_at_page_limit() {
    let server = MockServer::start().await;
    let root_html = format!(
        "<html><body><a href=\"{0}/b\">b</a><a href=\"{0}/c\">c</a></body></html>",
        server.uri()
    );
    Mock::given(method("GET")).and(path("/a")).respond_with(
        ResponseTemplate::new(200).set_body_string(root_html),
    ).mount(&server).await;
    Mock::given(method("GET")).and(path("/b")).respond_with(
        ResponseTemplate::new(200).set_body_string("<html></html>"),
    ).mount(&server).await;
    Mock::given(method("GET")).and(path("/c")).respond_with(
        ResponseTemplate::new(200).set_body_string("<html></html>"),
    ).mount(&server).await;

    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let ctx = ctx(&db, settings());

    let start = format!("{}/a", server.uri());
    let outcome = run_crawl(&ctx, "key-1", &start, &ScrapeOptions::default(), 1).await.unwrap();

    assert_eq!(outcome.pages.len(), 1);
}
