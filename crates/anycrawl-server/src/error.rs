//! API error envelope (§6/§7): `{success:false, error, message?, details?}`.
//!
//! Every handler returns `Result<T, ApiError>`; this module maps the core
//! crate's error types onto the taxonomy in §7 (validation, insufficient_
//! credits, not_found, internal) and the HTTP status each one carries.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use anycrawl_core::billing::LedgerError;
use anycrawl_core::db::DbError;
use anycrawl_core::jobs::JobStoreError;
use anycrawl_core::orchestrators::OrchestratorError;
use anycrawl_core::webhooks::WebhookError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    InsufficientCredits { required: i64, available: i64 },
    NotFound(String),
    Internal(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::InsufficientCredits { .. } => "insufficient_credits",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> Option<String> {
        match self {
            ApiError::Validation(msg) | ApiError::Internal(msg) | ApiError::NotFound(msg) => {
                Some(msg.clone())
            }
            ApiError::InsufficientCredits { required, available } => Some(format!(
                "required {required} credits, {available} available"
            )),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let envelope = ErrorEnvelope {
            success: false,
            error: self.code().to_string(),
            message: self.message(),
            details: None,
        };
        (status, Json(envelope)).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::JobStore(JobStoreError::NotFound(id)) => {
                ApiError::NotFound(format!("job {id} not found"))
            }
            OrchestratorError::Billing(LedgerError::InsufficientCredits {
                required,
                available,
                ..
            }) => ApiError::InsufficientCredits { required, available },
            OrchestratorError::Billing(LedgerError::ApiKeyNotFound(id)) => {
                ApiError::NotFound(format!("api key {id} not found"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JobStoreError> for ApiError {
    fn from(err: JobStoreError) -> Self {
        match err {
            JobStoreError::NotFound(id) => ApiError::NotFound(format!("job {id} not found")),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::SubscriptionNotFound(id) => {
                ApiError::NotFound(format!("webhook subscription {id} not found"))
            }
            WebhookError::DeliveryNotFound(id) => {
                ApiError::NotFound(format!("webhook delivery {id} not found"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}
