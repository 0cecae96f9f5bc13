//! Bank reconciliation matching.
//!
//! # Modules
//!
//! - `types` - Statement lines and the read-only payment view
//! - `matcher` - Exact-amount matching, candidates and adjustments
//! - `summary` - Reconciliation summary and difference preview
//! - `error` - Reconciliation-specific error types

pub mod error;
pub mod matcher;
pub mod summary;
pub mod types;

#[cfg(test)]
mod matcher_props;

pub use error::ReconciliationError;
pub use matcher::{MatchDecision, Matcher};
pub use summary::ReconciliationSummary;
pub use types::{PaymentRef, PaymentStatus, StatementLine};
