use thiserror::Error;

use crate::billing::LedgerError;
use crate::cache::CacheError;
use crate::jobs::JobStoreError;
use crate::queue::QueueError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("job store error: {0}")]
    JobStore(#[from] JobStoreError),
    #[error("billing error: {0}")]
    Billing(#[from] LedgerError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("adapter error: {0}")]
    Adapter(#[from] crate::adapters::AdapterError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
