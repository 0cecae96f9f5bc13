//! Postgres enum types and their mapping to the core domain enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use kontor_core::ledger::{AccountType as CoreAccountType, JournalStatus as CoreJournalStatus};
use kontor_core::period::PeriodStatus as CorePeriodStatus;
use kontor_core::reconciliation::PaymentStatus as CorePaymentStatus;
use kontor_core::recurring::Schedule as CoreSchedule;

/// Journal lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_status")]
pub enum JournalStatus {
    /// Editable draft.
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    /// Awaiting approval.
    #[sea_orm(string_value = "SUBMITTED")]
    Submitted,
    /// Approved, awaiting posting.
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    /// Posted, immutable.
    #[sea_orm(string_value = "POSTED")]
    Posted,
}

/// Accounting period status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "period_status")]
pub enum PeriodStatus {
    /// Accepting postings.
    #[sea_orm(string_value = "OPEN")]
    Open,
    /// Closed for posting.
    #[sea_orm(string_value = "CLOSED")]
    Closed,
    /// Closed and locked.
    #[sea_orm(string_value = "LOCKED")]
    Locked,
}

/// Chart-of-accounts classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    /// Asset.
    #[sea_orm(string_value = "asset")]
    Asset,
    /// Liability.
    #[sea_orm(string_value = "liability")]
    Liability,
    /// Equity.
    #[sea_orm(string_value = "equity")]
    Equity,
    /// Revenue.
    #[sea_orm(string_value = "revenue")]
    Revenue,
    /// Expense.
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Payment status as maintained by the payments module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
pub enum PaymentStatus {
    /// Not yet posted.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Posted to the ledger.
    #[sea_orm(string_value = "posted")]
    Posted,
    /// Voided.
    #[sea_orm(string_value = "voided")]
    Voided,
}

/// Recurring template schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "recurring_schedule")]
pub enum RecurringSchedule {
    /// Every month.
    #[sea_orm(string_value = "monthly")]
    Monthly,
    /// Every quarter.
    #[sea_orm(string_value = "quarterly")]
    Quarterly,
    /// Every year.
    #[sea_orm(string_value = "annually")]
    Annually,
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "audit_outcome")]
pub enum AuditOutcome {
    /// The operation committed.
    #[sea_orm(string_value = "success")]
    Success,
    /// The operation was refused or failed.
    #[sea_orm(string_value = "failure")]
    Failure,
}

impl From<JournalStatus> for CoreJournalStatus {
    fn from(status: JournalStatus) -> Self {
        match status {
            JournalStatus::Draft => Self::Draft,
            JournalStatus::Submitted => Self::Submitted,
            JournalStatus::Approved => Self::Approved,
            JournalStatus::Posted => Self::Posted,
        }
    }
}

impl From<CoreJournalStatus> for JournalStatus {
    fn from(status: CoreJournalStatus) -> Self {
        match status {
            CoreJournalStatus::Draft => Self::Draft,
            CoreJournalStatus::Submitted => Self::Submitted,
            CoreJournalStatus::Approved => Self::Approved,
            CoreJournalStatus::Posted => Self::Posted,
        }
    }
}

impl From<PeriodStatus> for CorePeriodStatus {
    fn from(status: PeriodStatus) -> Self {
        match status {
            PeriodStatus::Open => Self::Open,
            PeriodStatus::Closed => Self::Closed,
            PeriodStatus::Locked => Self::Locked,
        }
    }
}

impl From<CorePeriodStatus> for PeriodStatus {
    fn from(status: CorePeriodStatus) -> Self {
        match status {
            CorePeriodStatus::Open => Self::Open,
            CorePeriodStatus::Closed => Self::Closed,
            CorePeriodStatus::Locked => Self::Locked,
        }
    }
}

impl From<AccountType> for CoreAccountType {
    fn from(account_type: AccountType) -> Self {
        match account_type {
            AccountType::Asset => Self::Asset,
            AccountType::Liability => Self::Liability,
            AccountType::Equity => Self::Equity,
            AccountType::Revenue => Self::Revenue,
            AccountType::Expense => Self::Expense,
        }
    }
}

impl From<PaymentStatus> for CorePaymentStatus {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Pending => Self::Pending,
            PaymentStatus::Posted => Self::Posted,
            PaymentStatus::Voided => Self::Voided,
        }
    }
}

impl From<RecurringSchedule> for CoreSchedule {
    fn from(schedule: RecurringSchedule) -> Self {
        match schedule {
            RecurringSchedule::Monthly => Self::Monthly,
            RecurringSchedule::Quarterly => Self::Quarterly,
            RecurringSchedule::Annually => Self::Annually,
        }
    }
}

impl From<CoreSchedule> for RecurringSchedule {
    fn from(schedule: CoreSchedule) -> Self {
        match schedule {
            CoreSchedule::Monthly => Self::Monthly,
            CoreSchedule::Quarterly => Self::Quarterly,
            CoreSchedule::Annually => Self::Annually,
        }
    }
}

impl From<kontor_core::audit::AuditOutcome> for AuditOutcome {
    fn from(outcome: kontor_core::audit::AuditOutcome) -> Self {
        match outcome {
            kontor_core::audit::AuditOutcome::Success => Self::Success,
            kontor_core::audit::AuditOutcome::Failure => Self::Failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_journal_status_round_trips_through_core() {
        for status in JournalStatus::iter() {
            let core: CoreJournalStatus = status.into();
            assert_eq!(JournalStatus::from(core), status);
            assert_eq!(status.to_value(), core.as_str());
        }
    }

    #[test]
    fn test_period_status_matches_core_codes() {
        for status in PeriodStatus::iter() {
            let core: CorePeriodStatus = status.into();
            assert_eq!(status.to_value(), core.as_str());
        }
    }
}
