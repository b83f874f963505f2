//! Job Store (C3): job creation and status-machine transitions.
//!
//! Every transition is written as an `UPDATE ... WHERE id = ? AND status =
//! ?`, so a stale read can never smuggle an illegal transition through --
//! if the row isn't in the expected status by the time the write lands, the
//! update simply matches zero rows and the caller gets `IllegalTransition`.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::DbPool;
use crate::models::job::{Job, JobKind, JobStatus, NewJob};
use crate::schema::jobs;
use crate::with_conn;

use super::error::JobStoreError;

pub async fn create_job(
    pool: &DbPool,
    kind: JobKind,
    queue_name: &str,
    api_key_id: &str,
    input_url: &str,
) -> Result<Job, JobStoreError> {
    let new_job = NewJob::create(kind, queue_name, api_key_id, input_url);
    with_conn!(pool, conn => {
        diesel::insert_into(jobs::table).values(&new_job).execute(&mut conn).await?;
    });
    get_job(pool, &new_job.id)
        .await?
        .ok_or_else(|| JobStoreError::NotFound(new_job.id.clone()))
}

pub async fn get_job(pool: &DbPool, job_id: &str) -> Result<Option<Job>, JobStoreError> {
    with_conn!(pool, conn => {
        Ok(jobs::table
            .filter(jobs::id.eq(job_id))
            .select(Job::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    })
}

/// Apply a guarded `from -> to` transition, returning `IllegalTransition`
/// when the row is not currently in (one of) `from`.
async fn guarded_transition(
    pool: &DbPool,
    job_id: &str,
    from: &[JobStatus],
    to: JobStatus,
) -> Result<Job, JobStoreError> {
    let from_strs: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();

    let rows = with_conn!(pool, conn => {
        diesel::update(
            jobs::table
                .filter(jobs::id.eq(job_id))
                .filter(jobs::status.eq_any(from_strs)),
        )
        .set((
            jobs::status.eq(to.as_str()),
            jobs::updated_at.eq(Utc::now().to_rfc3339()),
        ))
        .execute(&mut conn)
        .await?
    });

    if rows == 1 {
        return get_job(pool, job_id)
            .await?
            .ok_or_else(|| JobStoreError::NotFound(job_id.to_string()));
    }

    let current = get_job(pool, job_id)
        .await?
        .ok_or_else(|| JobStoreError::NotFound(job_id.to_string()))?;
    Err(JobStoreError::IllegalTransition {
        job_id: job_id.to_string(),
        from: current.status,
        to: to.as_str().to_string(),
    })
}

pub async fn mark_running(pool: &DbPool, job_id: &str) -> Result<Job, JobStoreError> {
    guarded_transition(pool, job_id, &[JobStatus::Pending], JobStatus::Running).await
}

pub async fn mark_completed(
    pool: &DbPool,
    job_id: &str,
    result_blob: Option<String>,
) -> Result<Job, JobStoreError> {
    guarded_transition(pool, job_id, &[JobStatus::Running], JobStatus::Completed).await?;
    if let Some(blob) = result_blob {
        with_conn!(pool, conn => {
            diesel::update(jobs::table.filter(jobs::id.eq(job_id)))
                .set(jobs::result_blob.eq(blob))
                .execute(&mut conn)
                .await?;
        });
    }
    get_job(pool, job_id)
        .await?
        .ok_or_else(|| JobStoreError::NotFound(job_id.to_string()))
}

pub async fn mark_failed(
    pool: &DbPool,
    job_id: &str,
    failure_message: &str,
) -> Result<Job, JobStoreError> {
    guarded_transition(
        pool,
        job_id,
        &[JobStatus::Pending, JobStatus::Running],
        JobStatus::Failed,
    )
    .await?;
    with_conn!(pool, conn => {
        diesel::update(jobs::table.filter(jobs::id.eq(job_id)))
            .set(jobs::failure_message.eq(failure_message))
            .execute(&mut conn)
            .await?;
    });
    get_job(pool, job_id)
        .await?
        .ok_or_else(|| JobStoreError::NotFound(job_id.to_string()))
}

pub async fn mark_cancelled(pool: &DbPool, job_id: &str) -> Result<Job, JobStoreError> {
    guarded_transition(
        pool,
        job_id,
        &[JobStatus::Pending, JobStatus::Running],
        JobStatus::Cancelled,
    )
    .await
}

/// Increment `cache_hits` and `completed_count` for a page served from
/// cache. Not status-guarded: cache hits can land at any point before the
/// job reaches a terminal state.
pub async fn record_cache_hit(pool: &DbPool, job_id: &str) -> Result<(), JobStoreError> {
    with_conn!(pool, conn => {
        diesel::update(jobs::table.filter(jobs::id.eq(job_id)))
            .set((
                jobs::cache_hits.eq(jobs::cache_hits + 1),
                jobs::completed_count.eq(jobs::completed_count + 1),
                jobs::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
    });
    Ok(())
}

/// Record one page's completion (success or failure) against the job's
/// running tallies, used by crawl/search/map orchestrators as each page
/// finishes.
pub async fn record_page_result(
    pool: &DbPool,
    job_id: &str,
    succeeded: bool,
) -> Result<(), JobStoreError> {
    with_conn!(pool, conn => {
        if succeeded {
            diesel::update(jobs::table.filter(jobs::id.eq(job_id)))
                .set((
                    jobs::completed_count.eq(jobs::completed_count + 1),
                    jobs::updated_at.eq(Utc::now().to_rfc3339()),
                ))
                .execute(&mut conn)
                .await?;
        } else {
            diesel::update(jobs::table.filter(jobs::id.eq(job_id)))
                .set((
                    jobs::failed_count.eq(jobs::failed_count + 1),
                    jobs::updated_at.eq(Utc::now().to_rfc3339()),
                ))
                .execute(&mut conn)
                .await?;
        }
    });
    Ok(())
}

/// Set the job's expected total page count, once it becomes known (e.g.
/// after a crawl's initial URL discovery pass).
pub async fn set_total_count(pool: &DbPool, job_id: &str, total: i32) -> Result<(), JobStoreError> {
    with_conn!(pool, conn => {
        diesel::update(jobs::table.filter(jobs::id.eq(job_id)))
            .set((jobs::total_count.eq(total), jobs::updated_at.eq(Utc::now().to_rfc3339())))
            .execute(&mut conn)
            .await?;
    });
    Ok(())
}
