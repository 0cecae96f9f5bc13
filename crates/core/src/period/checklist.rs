//! Period-close checklist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kontor_shared::types::UserId;

/// Items every new period is created with, as `(code, label)`.
pub const BASELINE_CHECKLIST: [(&str, &str); 6] = [
    ("BANK_RECONCILED", "Bank accounts reconciled"),
    ("AP_SUBLEDGER_RECONCILED", "Payables subledger reconciled to control account"),
    ("AR_SUBLEDGER_RECONCILED", "Receivables subledger reconciled to control account"),
    ("ACCRUALS_POSTED", "Accruals and prepayments posted"),
    ("DEPRECIATION_POSTED", "Depreciation run posted"),
    ("TRIAL_BALANCE_REVIEWED", "Trial balance reviewed"),
];

/// A sign-off item on a period's close checklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    /// Stable item code.
    pub code: String,
    /// Display label.
    pub label: String,
    /// Who signed the item off.
    pub completed_by: Option<UserId>,
    /// When the item was signed off.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChecklistItem {
    /// Creates an outstanding item.
    #[must_use]
    pub fn new(code: &str, label: &str) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
            completed_by: None,
            completed_at: None,
        }
    }

    /// The baseline set, all outstanding.
    #[must_use]
    pub fn baseline() -> Vec<Self> {
        BASELINE_CHECKLIST
            .iter()
            .map(|(code, label)| Self::new(code, label))
            .collect()
    }

    /// Returns true once signed off.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Result of signing off a checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecklistCompletion {
    /// The item is now complete.
    Completed {
        /// Who signed it off.
        completed_by: UserId,
        /// When.
        completed_at: DateTime<Utc>,
    },
    /// The item was already complete; nothing changes.
    AlreadyComplete,
}
