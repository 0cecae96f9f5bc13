//! Recurring journal templates.
//!
//! Templates materialise DRAFT journals on request. Scheduling is external;
//! the schedule stored on a template is informational.

pub mod error;
pub mod generator;
pub mod types;

pub use error::RecurringError;
pub use generator::{GeneratedJournal, RecurringGenerator};
pub use types::{RecurringTemplate, Schedule};
