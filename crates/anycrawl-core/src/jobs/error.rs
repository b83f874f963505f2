use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("database error: {0}")]
    Database(#[from] DbError),
    #[error("job {0} not found")]
    NotFound(String),
    #[error("job {job_id} cannot transition from {from} to {to}")]
    IllegalTransition {
        job_id: String,
        from: String,
        to: String,
    },
}
