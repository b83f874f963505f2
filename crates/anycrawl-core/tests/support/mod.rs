//! Shared scaffolding for the integration tests: a file-backed SQLite
//! database (migrated fresh per test) and a couple of row-seeding helpers.
//!
//! A real temp file is used rather than `sqlite::memory:` because
//! `SqlitePool::get` opens a brand new connection per call -- an in-memory
//! database wouldn't survive past the first one.

use anycrawl_core::config::CreditWeights;
use anycrawl_core::db::DbPool;
use anycrawl_core::migrations::run_migrations;
use anycrawl_core::with_conn;

pub struct TestDb {
    pub pool: DbPool,
    _tmp: tempfile::TempPath,
}

impl TestDb {
    pub async fn new() -> Self {
        let tmp = tempfile::NamedTempFile::new().unwrap().into_temp_path();
        let pool = DbPool::from_url(tmp.to_str().unwrap()).unwrap();
        run_migrations(&pool).await.unwrap();
        Self { pool, _tmp: tmp }
    }
}

/// Insert an API key with a starting credit balance.
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

/// Current `api_keys.credits` balance.
pub async fn api_key_credits(pool: &DbPool, id: &str) -> i64 {
    use anycrawl_core::schema::api_keys;
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;

    with_conn!(pool, conn => {
        api_keys::table
            .filter(api_keys::id.eq(id))
            .select(api_keys::credits)
            .first(&mut conn)
            .await
            .unwrap()
    })
}

/// Seed a `scheduled_tasks` row plus a `running` `task_executions` row
/// started `age` in the past, for reaper tests.
pub async fn seed_stale_execution(
    pool: &DbPool,
    scheduled_task_id: &str,
    job_id: &str,
    age: std::time::Duration,
) {
    use anycrawl_core::models::scheduler::{ExecutionStatus, NewScheduledTask, NewTaskExecution};
    use anycrawl_core::schema::{scheduled_tasks, task_executions};
    use chrono::Utc;
    use diesel_async::RunQueryDsl;

    let now = Utc::now().to_rfc3339();
    let started_at = (Utc::now() - chrono::Duration::from_std(age).unwrap()).to_rfc3339();

    let task = NewScheduledTask {
        id: scheduled_task_id.to_string(),
        job_id: job_id.to_string(),
        kind: "crawl".to_string(),
        total_executions: 1,
        failed_executions: 0,
        created_at: now.clone(),
        updated_at: now.clone(),
    };
    with_conn!(pool, conn => {
        diesel::insert_into(scheduled_tasks::table).values(&task).execute(&mut conn).await.unwrap();
    });

    let execution = NewTaskExecution {
        id: uuid::Uuid::new_v4().to_string(),
        scheduled_task_id: scheduled_task_id.to_string(),
        job_id: job_id.to_string(),
        status: ExecutionStatus::Running.as_str().to_string(),
        started_at,
        finished_at: None,
        reason: None,
    };
    with_conn!(pool, conn => {
        diesel::insert_into(task_executions::table).values(&execution).execute(&mut conn).await.unwrap();
    });
}

/// Total row count in `jobs`, used to assert that a rejected admission
/// never leaves a dangling job behind.
pub async fn job_count(pool: &DbPool) -> i64 {
    use anycrawl_core::schema::jobs;
    use diesel::dsl::count_star;
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;

    with_conn!(pool, conn => {
        jobs::table.select(count_star()).first(&mut conn).await.unwrap()
    })
}

/// Every `billing_ledger` row for `job_id`, oldest first.
pub async fn ledger_entries_for_job(
    pool: &DbPool,
    job_id: &str,
) -> Vec<anycrawl_core::models::billing::LedgerEntry> {
    use anycrawl_core::schema::billing_ledger;
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;

    with_conn!(pool, conn => {
        billing_ledger::table
            .filter(billing_ledger::job_id.eq(job_id))
            .order(billing_ledger::created_at.asc())
            .select(anycrawl_core::models::billing::LedgerEntry::as_select())
            .load(&mut conn)
            .await
            .unwrap()
    })
}

/// The most recently written `billing_ledger` row for `job_id`.
pub async fn latest_ledger_entry(pool: &DbPool, job_id: &str) -> anycrawl_core::models::billing::LedgerEntry {
    use anycrawl_core::schema::billing_ledger;
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;

    with_conn!(pool, conn => {
        billing_ledger::table
            .filter(billing_ledger::job_id.eq(job_id))
            .order(billing_ledger::created_at.desc())
            .select(anycrawl_core::models::billing::LedgerEntry::as_select())
            .first(&mut conn)
            .await
            .unwrap()
    })
}

/// Credit weights with every surcharge set to a small, distinct value so
/// tests can assert on exact totals instead of tolerating whatever the
/// environment-derived defaults happen to be.
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
