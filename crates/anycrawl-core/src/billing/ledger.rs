//! Billing ledger: `charge_delta` and `charge_to_used` (C2).
//!
//! Every mutation to `jobs.credits_used` and `api_keys.credits` is paired
//! with a `billing_ledger` row in the same transaction, and every ledger
//! row carries a globally-unique `idempotency_key`. Concurrent writers to
//! the same job are reconciled with an optimistic compare-and-swap on
//! `jobs.credits_used`, retried up to `MAX_CAS_RETRIES` times.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::billing::{ChargeDetails, ChargeMode, LedgerEntry, NewLedgerEntry};
use crate::schema::{api_keys, billing_ledger, jobs};
use crate::with_conn;

use super::error::LedgerError;

const MAX_CAS_RETRIES: u32 = 5;

/// Result of a successful (or deduped) charge.
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    /// Credits actually applied to `jobs.credits_used` by this call. Zero
    /// when the call deduped against an existing ledger entry, or when a
    /// target-mode call's target was already met.
    pub charged: i64,
    pub before_used: i64,
    pub after_used: i64,
    pub after_credits: Option<i64>,
    pub ledger_entry: Option<LedgerEntry>,
}

fn synthesize_delta_key(job_id: &str, before_used: i64, after_used: i64, reason: &str) -> String {
    format!("billing:delta:{job_id}:{before_used}->{after_used}:{reason}")
}

fn synthesize_target_key(job_id: &str, target_used: i64, reason: &str) -> String {
    format!("billing:target:{job_id}:{target_used}:{reason}")
}

/// Load a job row's current `credits_used` and owning `api_key_id`.
async fn load_job_used<C>(conn: &mut C, job_id: &str) -> Result<(i64, String), LedgerError>
where
    C: AsyncConnection,
{
    jobs::table
        .filter(jobs::id.eq(job_id))
        .select((jobs::credits_used, jobs::api_key_id))
        .first::<(i64, String)>(conn)
        .await
        .optional()?
        .ok_or_else(|| LedgerError::JobNotFound(job_id.to_string()))
}

/// Find an existing ledger row by idempotency key, if any.
async fn find_existing<C>(conn: &mut C, key: &str) -> Result<Option<LedgerEntry>, LedgerError>
where
    C: AsyncConnection,
{
    Ok(billing_ledger::table
        .filter(billing_ledger::idempotency_key.eq(key))
        .select(LedgerEntry::as_select())
        .first(conn)
        .await
        .optional()?)
}

/// Debit `api_keys.credits` by `charge` and return the resulting balance.
async fn debit_api_key<C>(conn: &mut C, api_key_id: &str, charge: i64) -> Result<i64, LedgerError>
where
    C: AsyncConnection,
{
    diesel::update(api_keys::table.filter(api_keys::id.eq(api_key_id)))
        .set(api_keys::credits.eq(api_keys::credits - charge))
        .execute(conn)
        .await?;
    let balance = api_keys::table
        .filter(api_keys::id.eq(api_key_id))
        .select(api_keys::credits)
        .first::<i64>(conn)
        .await?;
    Ok(balance)
}

async fn insert_ledger_row<C>(
    conn: &mut C,
    job_id: &str,
    api_key_id: &str,
    mode: ChargeMode,
    reason: &str,
    key: &str,
    before_used: i64,
    after_used: i64,
    before_credits: Option<i64>,
    after_credits: Option<i64>,
    details: &ChargeDetails,
) -> Result<usize, LedgerError>
where
    C: AsyncConnection,
{
    let row = NewLedgerEntry {
        id: Uuid::new_v4().to_string(),
        idempotency_key: key.to_string(),
        job_id: job_id.to_string(),
        api_key_id: api_key_id.to_string(),
        mode: mode.as_str().to_string(),
        reason: reason.to_string(),
        charged: after_used - before_used,
        before_used,
        after_used,
        before_credits,
        after_credits,
        details_json: serde_json::to_string(details)?,
        created_at: Utc::now().to_rfc3339(),
    };
    Ok(diesel::insert_into(billing_ledger::table)
        .values(row)
        .on_conflict(billing_ledger::idempotency_key)
        .do_nothing()
        .execute(conn)
        .await?)
}

/// Additively charge `delta` credits against `job_id`. `delta` must be > 0;
/// callers wanting a strict no-op should simply skip the call.
///
/// If `idempotency_key` is supplied and a ledger row already exists for it,
/// the call is a pure dedup: no balance is touched and `charged == 0`.
/// Otherwise the key is synthesized from the observed before/after
/// `credits_used` values, which means an unkeyed retry after the first
/// attempt's CAS update already landed is *not* guaranteed to dedup --
/// callers that need retry-safety must pass an explicit key.
pub async fn charge_delta(
    pool: &DbPool,
    job_id: &str,
    delta: i64,
    reason: &str,
    idempotency_key: Option<String>,
    details: ChargeDetails,
) -> Result<ChargeOutcome, LedgerError> {
    with_conn!(pool, conn => {
        conn.transaction::<_, LedgerError, _>(|conn| Box::pin(async move {
            if let Some(key) = &idempotency_key {
                if let Some(existing) = find_existing(conn, key).await? {
                    return Ok(ChargeOutcome {
                        charged: 0,
                        before_used: existing.before_used,
                        after_used: existing.after_used,
                        after_credits: existing.after_credits,
                        ledger_entry: Some(existing),
                    });
                }
            }

            if delta <= 0 {
                let (used, _) = load_job_used(conn, job_id).await?;
                return Ok(ChargeOutcome {
                    charged: 0,
                    before_used: used,
                    after_used: used,
                    after_credits: None,
                    ledger_entry: None,
                });
            }

            let mut before_used = 0i64;
            let mut after_used = 0i64;
            let mut api_key_id = String::new();
            let mut applied = false;
            for _ in 0..MAX_CAS_RETRIES {
                let (current, owner) = load_job_used(conn, job_id).await?;
                api_key_id = owner;
                let candidate = current + delta;
                let rows = diesel::update(
                    jobs::table
                        .filter(jobs::id.eq(job_id))
                        .filter(jobs::credits_used.eq(current)),
                )
                .set((
                    jobs::credits_used.eq(candidate),
                    jobs::updated_at.eq(Utc::now().to_rfc3339()),
                ))
                .execute(conn)
                .await?;
                if rows == 1 {
                    before_used = current;
                    after_used = candidate;
                    applied = true;
                    break;
                }
            }
            if !applied {
                return Err(LedgerError::CasConflict(job_id.to_string()));
            }

            let key = idempotency_key
                .unwrap_or_else(|| synthesize_delta_key(job_id, before_used, after_used, reason));
            let details = details.normalize(delta, reason);
            let after_credits = debit_api_key(conn, &api_key_id, delta).await?;
            let before_credits = after_credits + delta;

            let inserted = insert_ledger_row(
                conn, job_id, &api_key_id, ChargeMode::Delta, reason, &key,
                before_used, after_used, Some(before_credits), Some(after_credits), &details,
            ).await?;

            if inserted == 0 {
                // Synthesized-key race: another writer reserved this exact
                // (before, after) pair first. Treat as a dedup; the balance
                // mutation above is a known, documented approximation for
                // this rare race (see DESIGN.md).
                let existing = find_existing(conn, &key).await?;
                return Ok(ChargeOutcome {
                    charged: 0,
                    before_used,
                    after_used,
                    after_credits: existing.as_ref().and_then(|e| e.after_credits),
                    ledger_entry: existing,
                });
            }

            let ledger_entry = find_existing(conn, &key).await?;
            Ok(ChargeOutcome {
                charged: delta,
                before_used,
                after_used,
                after_credits: Some(after_credits),
                ledger_entry,
            })
        })).await
    })
}

/// Monotonically raise `jobs.credits_used` to `target_used`. A target at or
/// below the current value is a no-op (`charged == 0`); target-mode never
/// decreases `credits_used`.
///
/// Reusing an explicit `idempotency_key` for a *different* target is
/// rejected with `LedgerError::DuplicateKey`, since target-mode keys must
/// identify a single target value.
pub async fn charge_to_used(
    pool: &DbPool,
    job_id: &str,
    target_used: i64,
    reason: &str,
    idempotency_key: Option<String>,
    details: ChargeDetails,
) -> Result<ChargeOutcome, LedgerError> {
    with_conn!(pool, conn => {
        conn.transaction::<_, LedgerError, _>(|conn| Box::pin(async move {
            if let Some(key) = &idempotency_key {
                if let Some(existing) = find_existing(conn, key).await? {
                    if existing.after_used == target_used {
                        return Ok(ChargeOutcome {
                            charged: 0,
                            before_used: existing.before_used,
                            after_used: existing.after_used,
                            after_credits: existing.after_credits,
                            ledger_entry: Some(existing),
                        });
                    }
                    return Err(LedgerError::DuplicateKey(key.clone()));
                }
            }

            let mut before_used = 0i64;
            let mut after_used = 0i64;
            let mut api_key_id = String::new();
            let mut applied = false;
            for _ in 0..MAX_CAS_RETRIES {
                let (current, owner) = load_job_used(conn, job_id).await?;
                api_key_id = owner;
                if target_used <= current {
                    return Ok(ChargeOutcome {
                        charged: 0,
                        before_used: current,
                        after_used: current,
                        after_credits: None,
                        ledger_entry: None,
                    });
                }
                let rows = diesel::update(
                    jobs::table
                        .filter(jobs::id.eq(job_id))
                        .filter(jobs::credits_used.eq(current)),
                )
                .set((
                    jobs::credits_used.eq(target_used),
                    jobs::updated_at.eq(Utc::now().to_rfc3339()),
                ))
                .execute(conn)
                .await?;
                if rows == 1 {
                    before_used = current;
                    after_used = target_used;
                    applied = true;
                    break;
                }
            }
            if !applied {
                return Err(LedgerError::CasConflict(job_id.to_string()));
            }

            let charge = after_used - before_used;
            let key = idempotency_key
                .unwrap_or_else(|| synthesize_target_key(job_id, target_used, reason));
            let details = details.normalize(charge, reason);
            let after_credits = debit_api_key(conn, &api_key_id, charge).await?;
            let before_credits = after_credits + charge;

            let inserted = insert_ledger_row(
                conn, job_id, &api_key_id, ChargeMode::Target, reason, &key,
                before_used, after_used, Some(before_credits), Some(after_credits), &details,
            ).await?;

            if inserted == 0 {
                return Err(LedgerError::DuplicateKey(key));
            }

            let ledger_entry = find_existing(conn, &key).await?;
            Ok(ChargeOutcome {
                charged: charge,
                before_used,
                after_used,
                after_credits: Some(after_credits),
                ledger_entry,
            })
        })).await
    })
}
