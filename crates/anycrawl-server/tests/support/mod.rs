//! Shared scaffolding for the HTTP-layer tests: a file-backed SQLite
//! database plus a router wired on top of it, in the shape the teacher's
//! `setup_test_app` helpers take.

use anycrawl_core::config::{CreditWeights, Settings};
use anycrawl_core::db::DbPool;
use anycrawl_core::migrations::run_migrations;
use anycrawl_core::with_conn;
use anycrawl_server::{create_router, AppState};
use axum::Router;

/// Credit weights with distinct, small values so assertions on exact
/// charge totals don't depend on whatever the environment defaults to.
pub fn test_weights() -> CreditWeights {
    CreditWeights {
        base_scrape: 1,
        proxy_auto: 0,
        proxy_stealth: 2,
        proxy_base: 1,
        json_llm: 3,
        summary: 1,
        crawl_template: 1,
        search_template: 1,
        search_per_scrape: 1,
        map_template: 1,
    }
}

/// Build a router over a freshly migrated, file-backed SQLite database
/// with one API key (`key-1`) seeded with `credits`. Returns the temp file
/// alongside the router so the caller keeps it alive for the test's
/// duration.
pub async fn setup_test_app(credits: i64) -> (Router, tempfile::TempPath) {
    let tmp = tempfile::NamedTempFile::new().unwrap().into_temp_path();
    let pool = DbPool::from_url(tmp.to_str().unwrap()).unwrap();
    run_migrations(&pool).await.unwrap();
    seed_api_key(&pool, "key-1", credits).await;

    let settings = Settings {
        credit_weights: test_weights(),
        ..Settings::default()
    };
    let state = AppState::with_pool(pool, settings);
    (create_router(state), tmp)
}

pub async fn seed_api_key(pool: &DbPool, id: &str, credits: i64) {
    use anycrawl_core::models::billing::NewApiKey;
    use anycrawl_core::schema::api_keys;
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;

    let row = NewApiKey {
        id: id.to_string(),
        credits,
        last_used_at: None,
    };
    with_conn!(pool, conn => {
        diesel::insert_into(api_keys::table).values(&row).execute(&mut conn).await.unwrap();
    });
}
