use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] DbError),
    #[error("job {0} not found")]
    JobNotFound(String),
    #[error("optimistic concurrency retries exhausted for job {0}")]
    CasConflict(String),
    #[error("idempotency key {0} already used for a different target")]
    DuplicateKey(String),
    #[error("api key {0} not found")]
    ApiKeyNotFound(String),
    #[error("insufficient credits for api key {api_key_id}: required {required}, available {available}")]
    InsufficientCredits {
        api_key_id: String,
        required: i64,
        available: i64,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
