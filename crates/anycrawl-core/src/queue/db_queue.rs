//! Durable named-queue abstraction (C4), backed by `queue_messages`.
//!
//! Visibility timeout semantics: a claimed message is invisible to other
//! claimants until `leased_until`, after which it becomes reclaimable again
//! regardless of whether the original claimant ever calls `complete`/`fail`
//! -- the reaper (C5) is what actually notices an abandoned lease and fails
//! the owning job, this queue only makes the message available again.

use chrono::{Duration as ChronoDuration, Utc};
use diesel::prelude::*;
use diesel::BoolExpressionMethods;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::queue::{MessageStatus, NewQueueMessage, QueueMessage};
use crate::schema::queue_messages;
use crate::with_conn;

use super::error::QueueError;
use super::handle::LeaseHandle;

#[derive(Clone)]
pub struct DbQueue {
    pool: DbPool,
}

impl DbQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Enqueue a message for `job_id` on `queue_name`, visible immediately.
    pub async fn enqueue(
        &self,
        queue_name: &str,
        job_id: &str,
        payload: &serde_json::Value,
    ) -> Result<QueueMessage, QueueError> {
        let now = Utc::now().to_rfc3339();
        let row = NewQueueMessage {
            id: Uuid::new_v4().to_string(),
            queue_name: queue_name.to_string(),
            job_id: job_id.to_string(),
            payload: serde_json::to_string(payload)?,
            status: MessageStatus::Queued.as_str().to_string(),
            leased_until: None,
            visible_at: now.clone(),
            created_at: now,
        };
        with_conn!(&self.pool, conn => {
            diesel::insert_into(queue_messages::table).values(&row).execute(&mut conn).await?;
        });
        get_message(&self.pool, &row.id).await
    }

    /// Claim the oldest visible message on `queue_name`, leasing it for
    /// `lease_seconds`. Returns `None` when nothing is claimable right now,
    /// including when a candidate was spotted but lost the claim race to
    /// another worker -- the caller's poll loop will simply try again.
    pub async fn claim_next(
        &self,
        queue_name: &str,
        lease_seconds: i64,
    ) -> Result<Option<LeaseHandle>, QueueError> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        let candidate = with_conn!(&self.pool, conn => {
            let queued_and_visible = queue_messages::status
                .eq(MessageStatus::Queued.as_str())
                .and(queue_messages::visible_at.le(now_str.clone()));
            let stale_lease = queue_messages::status
                .eq(MessageStatus::Leased.as_str())
                .and(queue_messages::leased_until.lt(now_str.clone()));

            queue_messages::table
                .filter(queue_messages::queue_name.eq(queue_name))
                .filter(queued_and_visible.or(stale_lease))
                .order(queue_messages::visible_at.asc())
                .select(QueueMessage::as_select())
                .first(&mut conn)
                .await
                .optional()?
        });

        let Some(candidate) = candidate else {
            return Ok(None);
        };

        let leased_until = (now + ChronoDuration::seconds(lease_seconds)).to_rfc3339();
        let rows = with_conn!(&self.pool, conn => {
            diesel::update(
                queue_messages::table
                    .filter(queue_messages::id.eq(&candidate.id))
                    .filter(queue_messages::status.eq(&candidate.status)),
            )
            .set((
                queue_messages::status.eq(MessageStatus::Leased.as_str()),
                queue_messages::leased_until.eq(&leased_until),
            ))
            .execute(&mut conn)
            .await?
        });

        if rows != 1 {
            return Ok(None);
        }

        Ok(Some(LeaseHandle::new(QueueMessage {
            status: MessageStatus::Leased.as_str().to_string(),
            leased_until: Some(leased_until),
            ..candidate
        })))
    }

    /// Mark a claimed message as done.
    pub async fn complete(&self, handle: LeaseHandle) -> Result<(), QueueError> {
        let message = handle.consume();
        with_conn!(&self.pool, conn => {
            diesel::update(queue_messages::table.filter(queue_messages::id.eq(&message.id)))
                .set(queue_messages::status.eq(MessageStatus::Done.as_str()))
                .execute(&mut conn)
                .await?;
        });
        Ok(())
    }

    /// Mark a claimed message as failed. `requeue` puts it back on the
    /// queue after `retry_delay_secs` (for transient failures); otherwise
    /// it's marked terminally failed.
    pub async fn fail(
        &self,
        handle: LeaseHandle,
        requeue: bool,
        retry_delay_secs: i64,
    ) -> Result<(), QueueError> {
        let message = handle.consume();
        if requeue {
            let visible_at = (Utc::now() + ChronoDuration::seconds(retry_delay_secs)).to_rfc3339();
            with_conn!(&self.pool, conn => {
                diesel::update(queue_messages::table.filter(queue_messages::id.eq(&message.id)))
                    .set((
                        queue_messages::status.eq(MessageStatus::Queued.as_str()),
                        queue_messages::leased_until.eq(None::<String>),
                        queue_messages::visible_at.eq(visible_at),
                    ))
                    .execute(&mut conn)
                    .await?;
            });
        } else {
            with_conn!(&self.pool, conn => {
                diesel::update(queue_messages::table.filter(queue_messages::id.eq(&message.id)))
                    .set(queue_messages::status.eq(MessageStatus::Failed.as_str()))
                    .execute(&mut conn)
                    .await?;
            });
        }
        Ok(())
    }

    /// Fail every non-terminal message belonging to `job_id`, used when a
    /// job is cancelled out from under its in-flight queue work.
    pub async fn cancel_job(&self, job_id: &str) -> Result<(), QueueError> {
        with_conn!(&self.pool, conn => {
            diesel::update(
                queue_messages::table
                    .filter(queue_messages::job_id.eq(job_id))
                    .filter(queue_messages::status.ne(MessageStatus::Done.as_str())),
            )
            .set(queue_messages::status.eq(MessageStatus::Failed.as_str()))
            .execute(&mut conn)
            .await?;
        });
        Ok(())
    }
}

async fn get_message(pool: &DbPool, id: &str) -> Result<QueueMessage, QueueError> {
    with_conn!(pool, conn => {
        queue_messages::table
            .filter(queue_messages::id.eq(id))
            .select(QueueMessage::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| QueueError::NotFound(id.to_string()))
    })
}
