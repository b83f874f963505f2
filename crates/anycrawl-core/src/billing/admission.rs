//! Pre-flight credit admission (the other half of C8's estimate/charge
//! split). Run *before* a job row exists, so an insufficient-credits
//! rejection never leaves a dangling job or ledger entry behind, per the
//! "no job row, no ledger entry" scenario.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::DbPool;
use crate::schema::api_keys;
use crate::with_conn;

use super::error::LedgerError;

/// Ensure `api_key_id` exists and can cover `estimate`. Callers skip this
/// entirely when credits are disabled.
pub async fn admit(pool: &DbPool, api_key_id: &str, estimate: i64) -> Result<(), LedgerError> {
    let balance: Option<i64> = with_conn!(pool, conn => {
        api_keys::table
            .filter(api_keys::id.eq(api_key_id))
            .select(api_keys::credits)
            .first(&mut conn)
            .await
            .optional()?
    });
    let balance = balance.ok_or_else(|| LedgerError::ApiKeyNotFound(api_key_id.to_string()))?;
    if balance < estimate {
        return Err(LedgerError::InsufficientCredits {
            api_key_id: api_key_id.to_string(),
            required: estimate,
            available: balance,
        });
    }
    Ok(())
}
