//! `run_map` and `run_search` (C7): sitemap-first URL discovery with a
//! search-engine fallback, and search-result scraping.

mod support;

use std::sync::Arc;

use anycrawl_core::adapters::{HttpScrapeEngine, SitemapXmlSource, StaticSiteSearchEngine};
use anycrawl_core::cache::{FsBlobStore, PageCache};
use anycrawl_core::cache::MapSource;
use anycrawl_core::config::Settings;
use anycrawl_core::models::job::JobStatus;
use anycrawl_core::orchestrators::context::OrchestratorContext;
use anycrawl_core::orchestrators::map::run_map;
use anycrawl_core::orchestrators::search::run_search;
use anycrawl_core::queue::DbQueue;
use anycrawl_core::request::ScrapeOptions;
use support::{seed_api_key, test_weights, TestDb};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> Settings {
    Settings {
        credit_weights: test_weights(),
        ..Settings::default()
    }
}

fn ctx_with_search_endpoint(db: &TestDb, search_endpoint: String) -> OrchestratorContext {
    let cache_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsBlobStore::new(cache_dir.into_path()));
    OrchestratorContext {
        pool: db.pool.clone(),
        cache: Arc::new(PageCache::new(store, "cache/".to_string())),
        queue: DbQueue::new(db.pool.clone()),
        scrape_engine: Arc::new(HttpScrapeEngine::default()),
        search_engine: Arc::new(StaticSiteSearchEngine::new(search_endpoint)),
        sitemap_source: Arc::new(SitemapXmlSource::default()),
        settings: Arc::new(settings()),
    }
}

#[tokio::test]
async fn map_prefers_the_sitemap_when_one_is_published() {
    let server = MockServer::start().await;
    let sitemap = format!(
        "<urlset><url><loc>{0}/a</loc></url><url><loc>{0}/b</loc></url></urlset>",
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap))
        .mount(&server)
        .await;

    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let ctx = ctx_with_search_endpoint(&db, format!("{}/search?q={{query}}", server.uri()));

    let outcome = run_map(&ctx, "key-1", &server.uri()).await.unwrap();

    assert_eq!(outcome.job.status(), JobStatus::Completed);
    assert_eq!(outcome.source, MapSource::Sitemap);
    assert_eq!(outcome.urls.len(), 2);
}

#[tokio::test]
async fn map_falls_back_to_search_when_no_sitemap_is_published() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><a href=\"/x\">x</a></body></html>",
        ))
        .mount(&server)
        .await;

    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let ctx = ctx_with_search_endpoint(&db, format!("{}/search?q={{query}}", server.uri()));

    let outcome = run_map(&ctx, "key-1", &server.uri()).await.unwrap();

    assert_eq!(outcome.source, MapSource::Search);
    assert_eq!(outcome.urls, vec!["/x".to_string()]);
}

#[tokio::test]
async fn search_scrapes_each_result_and_tallies_page_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<html><body><a href=\"{0}/r1\">r1</a><a href=\"{0}/r2\">r2</a></body></html>",
            server.uri()
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let db = TestDb::new().await;
    seed_api_key(&db.pool, "key-1", 100).await;
    let ctx = ctx_with_search_endpoint(&db, format!("{}/search?q={{query}}", server.uri()));

    let outcome = run_search(&ctx, "key-1", "widgets", &ScrapeOptions::default(), 10).await.unwrap();

    assert_eq!(outcome.job.status(), JobStatus::Completed);
    assert_eq!(outcome.results.len(), 1, "the failing result is tallied but not included in results");
    assert_eq!(outcome.job.completed_count, 1);
    assert_eq!(outcome.job.failed_count, 1);
}
