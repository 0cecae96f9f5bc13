//! Accounting periods and the period-close checklist.
//!
//! # Modules
//!
//! - `types` - Period status and period definition
//! - `checklist` - Close checklist items and the baseline set
//! - `service` - Close/lock/reopen transitions and period layout rules
//! - `error` - Period-specific error types

pub mod checklist;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use checklist::{BASELINE_CHECKLIST, ChecklistCompletion, ChecklistItem};
pub use error::PeriodError;
pub use service::{PeriodAction, PeriodService};
pub use types::{AccountingPeriod, PeriodStatus};
