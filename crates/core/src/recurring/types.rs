//! Recurring template types.

use serde::{Deserialize, Serialize};
use std::fmt;

use kontor_shared::types::{PeriodId, TemplateId};

use crate::ledger::JournalLineInput;

/// How often a template is meant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    /// Every period.
    Monthly,
    /// Every third period.
    Quarterly,
    /// Once a year.
    Annually,
}

impl Schedule {
    /// Returns the string representation of the schedule.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annually => "annually",
        }
    }

    /// Parses a schedule from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "annually" => Some(Self::Annually),
            _ => None,
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reusable journal shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTemplate {
    /// Unique identifier.
    pub id: TemplateId,
    /// Template name, copied into the generated journal's description.
    pub name: String,
    /// Lines copied verbatim into each generated journal.
    pub lines: Vec<JournalLineInput>,
    /// Informational schedule.
    pub schedule: Schedule,
    /// Inactive templates cannot generate.
    pub is_active: bool,
    /// Most recent period generated for.
    pub last_generated_period_id: Option<PeriodId>,
}
