//! Billing ledger and credit estimator (C2, C8).

pub mod admission;
pub mod error;
pub mod estimator;
pub mod ledger;

pub use admission::admit;
pub use error::LedgerError;
pub use ledger::{charge_delta, charge_to_used, ChargeOutcome};
