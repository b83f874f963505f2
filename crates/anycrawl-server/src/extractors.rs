//! Lightweight request extractors.
//!
//! Authentication middleware is explicitly out of scope (§1): this extractor
//! only resolves *which* api-key id a request is billed against, by reading
//! it straight off the `X-Api-Key` header. A real deployment puts a proper
//! auth layer in front of this crate; this extractor is the seam it would
//! plug into.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

pub struct ApiKeyId(pub String);

impl FromRequestParts<AppState> for ApiKeyId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ApiError::Validation("missing X-Api-Key header".to_string()))?;
        Ok(ApiKeyId(key))
    }
}
