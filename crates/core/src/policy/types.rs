//! Permission catalog and SoD rule types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use kontor_shared::types::SodRuleId;

/// Closed catalog of permissions known to the engine.
///
/// Permissions are global; tenants only decide which roles hold them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    /// Create and edit draft journals.
    #[serde(rename = "journal.create")]
    JournalCreate,
    /// Submit draft journals for approval.
    #[serde(rename = "journal.submit")]
    JournalSubmit,
    /// Approve or reject submitted journals.
    #[serde(rename = "journal.approve")]
    JournalApprove,
    /// Post approved journals.
    #[serde(rename = "journal.post")]
    JournalPost,
    /// Post journals touching controller-only accounts.
    #[serde(rename = "journal.final_post")]
    JournalFinalPost,
    /// Close an open period.
    #[serde(rename = "period.close")]
    PeriodClose,
    /// Lock a closed period.
    #[serde(rename = "period.lock")]
    PeriodLock,
    /// Reopen a closed or locked period.
    #[serde(rename = "period.reopen")]
    PeriodReopen,
    /// Sign off period-close checklist items.
    #[serde(rename = "period.checklist.complete")]
    PeriodChecklistComplete,
    /// Generate journals from recurring templates.
    #[serde(rename = "recurring.generate")]
    RecurringGenerate,
    /// Match statement lines and raise reconciliation adjustments.
    #[serde(rename = "bank.reconcile")]
    BankReconcile,
    /// Grant permissions to roles and roles to users.
    #[serde(rename = "sod.manage")]
    SodManage,
}

impl Permission {
    /// Every permission in the catalog.
    pub const ALL: [Self; 12] = [
        Self::JournalCreate,
        Self::JournalSubmit,
        Self::JournalApprove,
        Self::JournalPost,
        Self::JournalFinalPost,
        Self::PeriodClose,
        Self::PeriodLock,
        Self::PeriodReopen,
        Self::PeriodChecklistComplete,
        Self::RecurringGenerate,
        Self::BankReconcile,
        Self::SodManage,
    ];

    /// Returns the stable code stored in the database.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::JournalCreate => "journal.create",
            Self::JournalSubmit => "journal.submit",
            Self::JournalApprove => "journal.approve",
            Self::JournalPost => "journal.post",
            Self::JournalFinalPost => "journal.final_post",
            Self::PeriodClose => "period.close",
            Self::PeriodLock => "period.lock",
            Self::PeriodReopen => "period.reopen",
            Self::PeriodChecklistComplete => "period.checklist.complete",
            Self::RecurringGenerate => "recurring.generate",
            Self::BankReconcile => "bank.reconcile",
            Self::SodManage => "sod.manage",
        }
    }

    /// Human-readable description for the catalog listing.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::JournalCreate => "Create and edit draft journals",
            Self::JournalSubmit => "Submit journals for approval",
            Self::JournalApprove => "Approve or reject submitted journals",
            Self::JournalPost => "Post approved journals",
            Self::JournalFinalPost => "Post journals on controller-only accounts",
            Self::PeriodClose => "Close accounting periods",
            Self::PeriodLock => "Lock closed accounting periods",
            Self::PeriodReopen => "Reopen closed or locked periods",
            Self::PeriodChecklistComplete => "Sign off period-close checklist items",
            Self::RecurringGenerate => "Generate journals from recurring templates",
            Self::BankReconcile => "Reconcile bank statements",
            Self::SodManage => "Manage role grants",
        }
    }

    /// Parses a permission from its code.
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Effective permission set of a role or principal.
pub type PermissionSet = BTreeSet<Permission>;

/// A pair of permissions no single role or user may hold together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SodRule {
    /// Rule identifier.
    pub id: SodRuleId,
    /// First forbidden permission.
    pub permission_a: Permission,
    /// Second forbidden permission.
    pub permission_b: Permission,
    /// Why the pairing is forbidden.
    pub description: String,
    /// Inactive rules are kept for history but never evaluated.
    pub is_active: bool,
}

impl SodRule {
    /// Rules every tenant starts with.
    pub const BASELINE: [(Permission, Permission, &'static str); 2] = [
        (
            Permission::JournalSubmit,
            Permission::JournalApprove,
            "Journal submitters cannot approve journals",
        ),
        (
            Permission::JournalPost,
            Permission::JournalFinalPost,
            "Basic posting and final posting must be held by different roles",
        ),
    ];

    /// Creates an active rule.
    #[must_use]
    pub fn new(permission_a: Permission, permission_b: Permission, description: &str) -> Self {
        Self {
            id: SodRuleId::new(),
            permission_a,
            permission_b,
            description: description.to_string(),
            is_active: true,
        }
    }

    /// Returns true if `a` and `b` are this rule's pair, in either order.
    #[must_use]
    pub fn pairs(&self, a: Permission, b: Permission) -> bool {
        (self.permission_a == a && self.permission_b == b)
            || (self.permission_a == b && self.permission_b == a)
    }

    /// Returns true if the set holds both permissions of an active rule.
    #[must_use]
    pub fn is_violated_by(&self, permissions: &PermissionSet) -> bool {
        self.is_active
            && permissions.contains(&self.permission_a)
            && permissions.contains(&self.permission_b)
    }
}
