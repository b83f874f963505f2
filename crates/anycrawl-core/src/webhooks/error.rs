use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("database error: {0}")]
    Database(#[from] DbError),
    #[error("delivery {0} not found")]
    DeliveryNotFound(String),
    #[error("subscription {0} not found")]
    SubscriptionNotFound(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
