//! Core business logic for Kontor.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Every rule that decides whether a journal, period, template or statement line
//! may change state lives here; repositories load the facts and apply the result.
//!
//! # Modules
//!
//! - `policy` - Permission catalog and segregation-of-duties evaluation
//! - `ledger` - Journal lines, balance enforcement and the journal state machine
//! - `period` - Accounting periods and the close checklist
//! - `recurring` - Recurring journal templates
//! - `reconciliation` - Bank statement matching and reconciliation summaries
//! - `audit` - Audit record construction

pub mod audit;
pub mod ledger;
pub mod period;
pub mod policy;
pub mod reconciliation;
pub mod recurring;
