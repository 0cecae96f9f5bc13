//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `UserId` where a `TenantId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The all-zero ID.
            #[must_use]
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(TenantId, "Unique identifier for a tenant (the isolation root).");
typed_id!(UserId, "Unique identifier for a user (an authenticated principal).");
typed_id!(RoleId, "Unique identifier for a tenant-scoped role.");
typed_id!(
    AccountId,
    "Unique identifier for a chart of accounts entry."
);
typed_id!(JournalId, "Unique identifier for a journal.");
typed_id!(JournalLineId, "Unique identifier for a journal line.");
typed_id!(PeriodId, "Unique identifier for an accounting period.");
typed_id!(ChecklistItemId, "Unique identifier for a period checklist item.");
typed_id!(TemplateId, "Unique identifier for a recurring journal template.");
typed_id!(SodRuleId, "Unique identifier for a segregation-of-duties rule.");
typed_id!(BankAccountId, "Unique identifier for a bank account.");
typed_id!(StatementLineId, "Unique identifier for a bank statement line.");
typed_id!(PaymentId, "Unique identifier for a payment.");
typed_id!(AuditRecordId, "Unique identifier for an audit record.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
