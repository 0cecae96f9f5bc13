//! Audit record construction.
//!
//! Every mutating operation produces one record, on success and on failure.
//! Records are built here and persisted by the database layer outside the
//! operation's own transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use kontor_shared::AppError;
use kontor_shared::types::{AuditRecordId, TenantId, UserId};

/// Audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    /// Draft journal created.
    #[serde(rename = "journal.create")]
    JournalCreate,
    /// Draft journal edited.
    #[serde(rename = "journal.update")]
    JournalUpdate,
    /// Journal submitted.
    #[serde(rename = "journal.submit")]
    JournalSubmit,
    /// Journal approved.
    #[serde(rename = "journal.approve")]
    JournalApprove,
    /// Journal rejected back to draft.
    #[serde(rename = "journal.reject")]
    JournalReject,
    /// Journal posted.
    #[serde(rename = "journal.post")]
    JournalPost,
    /// Reversing journal created.
    #[serde(rename = "journal.reverse")]
    JournalReverse,
    /// Period created.
    #[serde(rename = "period.create")]
    PeriodCreate,
    /// Period closed.
    #[serde(rename = "period.close")]
    PeriodClose,
    /// Period locked.
    #[serde(rename = "period.lock")]
    PeriodLock,
    /// Period reopened.
    #[serde(rename = "period.reopen")]
    PeriodReopen,
    /// Checklist item signed off.
    #[serde(rename = "period.checklist.complete")]
    ChecklistComplete,
    /// Recurring template created.
    #[serde(rename = "recurring.create_template")]
    TemplateCreate,
    /// Journal generated from a template.
    #[serde(rename = "recurring.generate")]
    RecurringGenerate,
    /// Statement line matched.
    #[serde(rename = "bank.match")]
    BankMatch,
    /// Reconciliation adjustment raised.
    #[serde(rename = "bank.adjustment")]
    BankAdjustment,
    /// Role created.
    #[serde(rename = "sod.create_role")]
    RoleCreate,
    /// Permission granted to a role.
    #[serde(rename = "sod.grant_permission")]
    GrantPermission,
    /// Role assigned to a user.
    #[serde(rename = "sod.assign_role")]
    AssignRole,
}

impl AuditAction {
    /// Returns the stable action code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::JournalCreate => "journal.create",
            Self::JournalUpdate => "journal.update",
            Self::JournalSubmit => "journal.submit",
            Self::JournalApprove => "journal.approve",
            Self::JournalReject => "journal.reject",
            Self::JournalPost => "journal.post",
            Self::JournalReverse => "journal.reverse",
            Self::PeriodCreate => "period.create",
            Self::PeriodClose => "period.close",
            Self::PeriodLock => "period.lock",
            Self::PeriodReopen => "period.reopen",
            Self::ChecklistComplete => "period.checklist.complete",
            Self::TemplateCreate => "recurring.create_template",
            Self::RecurringGenerate => "recurring.generate",
            Self::BankMatch => "bank.match",
            Self::BankAdjustment => "bank.adjustment",
            Self::RoleCreate => "sod.create_role",
            Self::GrantPermission => "sod.grant_permission",
            Self::AssignRole => "sod.assign_role",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the audited operation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    /// The operation committed.
    Success,
    /// The operation was refused or failed.
    Failure,
}

impl AuditOutcome {
    /// Returns the string representation of the outcome.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Unique identifier.
    pub id: AuditRecordId,
    /// Tenant.
    pub tenant_id: TenantId,
    /// Acting principal.
    pub actor_id: UserId,
    /// What was attempted.
    pub action: AuditAction,
    /// The entity acted on.
    pub entity_id: Uuid,
    /// Success or failure.
    pub outcome: AuditOutcome,
    /// Error code on failure.
    pub error_code: Option<String>,
    /// Free-form context (reason, checklist code, grant warnings).
    pub detail: Option<serde_json::Value>,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Starts a record for `action` on `entity_id`, assumed successful.
    #[must_use]
    pub fn new(tenant_id: TenantId, actor_id: UserId, action: AuditAction, entity_id: Uuid) -> Self {
        Self {
            id: AuditRecordId::new(),
            tenant_id,
            actor_id,
            action,
            entity_id,
            outcome: AuditOutcome::Success,
            error_code: None,
            detail: None,
            occurred_at: Utc::now(),
        }
    }

    /// Attaches context.
    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Marks the record as a failure with the error's code and message.
    #[must_use]
    pub fn failed(mut self, err: &AppError) -> Self {
        self.outcome = AuditOutcome::Failure;
        self.error_code = Some(err.error_code().to_string());
        let message = serde_json::Value::String(err.message().to_string());
        match &mut self.detail {
            Some(serde_json::Value::Object(map)) => {
                map.insert("error".to_string(), message);
            }
            _ => self.detail = Some(serde_json::json!({ "error": message })),
        }
        self
    }

    /// Builds the record for a finished operation.
    #[must_use]
    pub fn finish<T>(self, result: &Result<T, AppError>) -> Self {
        match result {
            Ok(_) => self,
            Err(err) => self.failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_record() {
        let entity = Uuid::now_v7();
        let record = AuditRecord::new(TenantId::new(), UserId::new(), AuditAction::JournalPost, entity);
        let record = record.finish::<()>(&Ok(()));
        assert_eq!(record.outcome, AuditOutcome::Success);
        assert_eq!(record.entity_id, entity);
        assert!(record.error_code.is_none());
    }

    #[test]
    fn test_failure_keeps_detail() {
        let record = AuditRecord::new(TenantId::new(), UserId::new(), AuditAction::JournalReject, Uuid::nil())
            .with_detail(serde_json::json!({ "reason": "wrong account" }))
            .finish::<()>(&Err(AppError::InvalidStateTransition("posted".into())));
        assert_eq!(record.outcome, AuditOutcome::Failure);
        assert_eq!(record.error_code.as_deref(), Some("INVALID_STATE_TRANSITION"));
        let detail = record.detail.unwrap();
        assert_eq!(detail["reason"], "wrong account");
        assert_eq!(detail["error"], "posted");
    }

    #[test]
    fn test_action_codes_match_serde() {
        let json = serde_json::to_string(&AuditAction::ChecklistComplete).unwrap();
        assert_eq!(json, format!("\"{}\"", AuditAction::ChecklistComplete.as_str()));
    }
}
