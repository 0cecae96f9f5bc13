//! Double-entry journal logic.
//!
//! This module implements the journal side of the engine:
//! - Journal and line types
//! - Line and chart-of-accounts validation
//! - The maker-checker state machine
//! - Period balance deltas committed by posting
//! - Reversing journals
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod reversal;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use balance::{AccountPeriodBalance, PeriodBalanceDelta, aggregate_deltas};
pub use error::LedgerError;
pub use reversal::ReversalService;
pub use service::{DraftJournal, JournalService};
pub use types::{
    Dimensions, JournalAction, JournalLineInput, JournalState, JournalStatus, JournalTotals, Side,
};
pub use validation::{
    AMOUNT_SCALE, AccountInfo, AccountType, is_storable_amount, requires_final_post,
    validate_lines,
};
