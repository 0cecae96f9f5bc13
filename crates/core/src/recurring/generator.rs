//! Recurring journal generation.

use chrono::NaiveDate;

use kontor_shared::types::AccountId;

use super::error::RecurringError;
use super::types::RecurringTemplate;
use crate::ledger::{AccountInfo, JournalLineInput, JournalTotals, validate_lines};
use crate::period::AccountingPeriod;
use crate::policy::{Permission, PermissionSet, PolicyEvaluator};

/// A draft journal produced from a template.
#[derive(Debug, Clone)]
pub struct GeneratedJournal {
    /// Journal date: the first day of the target period.
    pub journal_date: NaiveDate,
    /// Description naming the template and period.
    pub description: String,
    /// Lines copied from the template.
    pub lines: Vec<JournalLineInput>,
    /// Line totals.
    pub totals: JournalTotals,
}

/// Stateless generator.
pub struct RecurringGenerator;

impl RecurringGenerator {
    /// Produce a draft journal from `template` for `period`.
    ///
    /// `already_generated` reports whether the pair was generated before.
    /// Template lines are revalidated against the current chart of accounts
    /// and copied verbatim.
    pub fn generate<A>(
        template: &RecurringTemplate,
        period: &AccountingPeriod,
        already_generated: bool,
        permissions: &PermissionSet,
        account_lookup: A,
    ) -> Result<GeneratedJournal, RecurringError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        PolicyEvaluator::check_permission(permissions, Permission::RecurringGenerate)?;

        if !template.is_active {
            return Err(RecurringError::TemplateInactive(template.id));
        }
        if already_generated {
            return Err(RecurringError::AlreadyGenerated {
                template_id: template.id,
                period_id: period.id,
            });
        }

        let totals = validate_lines(&template.lines, account_lookup)?;

        Ok(GeneratedJournal {
            journal_date: period.start_date,
            description: format!(
                "{} ({} to {})",
                template.name, period.start_date, period.end_date
            ),
            lines: template.lines.clone(),
            totals,
        })
    }
}
