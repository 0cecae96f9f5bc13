//! Reversing journals for posted entries.

use kontor_shared::types::JournalId;

use super::error::LedgerError;
use super::types::{JournalLineInput, JournalStatus};
use crate::policy::{Permission, PermissionSet, PolicyEvaluator};

/// Stateless service for creating reversing lines.
pub struct ReversalService;

impl ReversalService {
    /// Checks that a journal may be reversed.
    ///
    /// Only posted journals, and only once.
    pub fn validate_reversal(
        journal_id: JournalId,
        status: JournalStatus,
        existing_reversal: Option<JournalId>,
        permissions: &PermissionSet,
    ) -> Result<(), LedgerError> {
        PolicyEvaluator::check_permission(permissions, Permission::JournalCreate)?;

        if status != JournalStatus::Posted {
            return Err(LedgerError::InvalidTransition {
                from: status,
                to: JournalStatus::Draft,
            });
        }
        if let Some(reversal) = existing_reversal {
            return Err(LedgerError::AlreadyReversed {
                original: journal_id,
                reversal,
            });
        }
        Ok(())
    }

    /// Swaps debits and credits, keeping accounts, memos and dimensions.
    #[must_use]
    pub fn reverse_lines(lines: &[JournalLineInput]) -> Vec<JournalLineInput> {
        lines
            .iter()
            .map(|line| JournalLineInput {
                debit: line.credit,
                credit: line.debit,
                ..line.clone()
            })
            .collect()
    }
}
