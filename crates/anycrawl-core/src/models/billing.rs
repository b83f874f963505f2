//! Billing ledger and API key models.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{api_keys, billing_ledger};

/// An API key's signed credit balance. May go negative by design when a
/// job's final charge exceeds its pre-check estimate.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = api_keys)]
pub struct ApiKey {
    pub id: String,
    pub credits: i64,
    pub last_used_at: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = api_keys)]
pub struct NewApiKey {
    pub id: String,
    pub credits: i64,
    pub last_used_at: Option<String>,
}

/// Charging mode for a ledger write. See `billing::ledger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeMode {
    /// Add a positive amount to `credits_used`.
    Delta,
    /// Raise `credits_used` monotonically to an absolute target.
    Target,
}

impl ChargeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delta => "delta",
            Self::Target => "target",
        }
    }
}

/// One itemized line in a `ChargeDetails` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeItem {
    pub code: String,
    pub credits: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// Version-tagged, itemized breakdown of a single ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeDetails {
    pub version: u32,
    pub basis: String,
    pub calculator: String,
    pub total: i64,
    pub items: Vec<ChargeItem>,
}

impl ChargeDetails {
    pub fn new(calculator: impl Into<String>, items: Vec<ChargeItem>) -> Self {
        let total = items.iter().map(|i| i.credits).sum();
        Self {
            version: 1,
            basis: "charged_delta".to_string(),
            calculator: calculator.into(),
            total,
            items,
        }
    }

    /// Drop non-positive items; if the remainder doesn't sum (within
    /// `1e-9`-equivalent integer tolerance of zero) to `committed_charge`,
    /// replace the items with a single `unattributed_adjustment` line for
    /// audit, recording the mismatch in `meta.source_total`.
    pub fn normalize(mut self, committed_charge: i64, reason: &str) -> Self {
        self.items.retain(|i| i.credits > 0);
        let sum: i64 = self.items.iter().map(|i| i.credits).sum();
        if sum != committed_charge {
            self.items = vec![ChargeItem {
                code: "unattributed_adjustment".to_string(),
                credits: committed_charge,
                meta: Some(serde_json::json!({
                    "reason": reason,
                    "source_total": sum,
                })),
            }];
        }
        self.total = committed_charge;
        self
    }
}

/// A committed billing ledger row. `idempotency_key` is globally unique and
/// is what makes retries safe.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = billing_ledger)]
pub struct LedgerEntry {
    pub id: String,
    pub idempotency_key: String,
    pub job_id: String,
    pub api_key_id: String,
    pub mode: String,
    pub reason: String,
    pub charged: i64,
    pub before_used: i64,
    pub after_used: i64,
    pub before_credits: Option<i64>,
    pub after_credits: Option<i64>,
    pub details_json: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = billing_ledger)]
pub struct NewLedgerEntry {
    pub id: String,
    pub idempotency_key: String,
    pub job_id: String,
    pub api_key_id: String,
    pub mode: String,
    pub reason: String,
    pub charged: i64,
    pub before_used: i64,
    pub after_used: i64,
    pub before_credits: Option<i64>,
    pub after_credits: Option<i64>,
    pub details_json: String,
    pub created_at: String,
}
