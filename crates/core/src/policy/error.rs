//! Policy error types.

use thiserror::Error;

use kontor_shared::AppError;
use kontor_shared::types::{RoleId, SodRuleId, UserId};

use super::evaluator::ConflictSet;
use super::types::Permission;

/// Errors raised by permission and SoD checks.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The actor does not hold the permission the action requires.
    #[error("Missing permission {0}")]
    PermissionDenied(Permission),

    /// The maker of a journal tried to check it.
    #[error("User {actor} prepared this journal and cannot approve it")]
    MakerChecker {
        /// The offending actor.
        actor: UserId,
    },

    /// The actor already exercised the other half of an active rule on the same journal.
    #[error("Segregation of duties rule {rule_id} violated: {description}")]
    RuleViolated {
        /// The triggered rule.
        rule_id: SodRuleId,
        /// The rule description.
        description: String,
    },

    /// A grant would create conflicts and enforcement is blocking.
    #[error("Grant would create {} segregation of duties conflict(s)", .0.len())]
    GrantConflicts(ConflictSet),

    /// Unknown permission code.
    #[error("Unknown permission code: {0}")]
    UnknownPermission(String),

    /// Role not found.
    #[error("Role {0} not found")]
    RoleNotFound(RoleId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PolicyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::MakerChecker { .. } | Self::RuleViolated { .. } | Self::GrantConflicts(_) => {
                "SOD_VIOLATION"
            }
            Self::UnknownPermission(_) => "UNKNOWN_PERMISSION",
            Self::RoleNotFound(_) => "ROLE_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::UnknownPermission(_) => 400,
            Self::PermissionDenied(_)
            | Self::MakerChecker { .. }
            | Self::RuleViolated { .. }
            | Self::GrantConflicts(_) => 403,
            Self::RoleNotFound(_) => 404,
            Self::Database(_) => 500,
        }
    }

    /// Returns true for segregation-of-duties failures.
    #[must_use]
    pub fn is_sod_violation(&self) -> bool {
        matches!(
            self,
            Self::MakerChecker { .. } | Self::RuleViolated { .. } | Self::GrantConflicts(_)
        )
    }
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        let message = err.to_string();
        match err {
            PolicyError::PermissionDenied(_) => Self::PermissionDenied(message),
            PolicyError::MakerChecker { .. }
            | PolicyError::RuleViolated { .. }
            | PolicyError::GrantConflicts(_) => Self::SodViolation(message),
            PolicyError::UnknownPermission(_) => Self::Validation(message),
            PolicyError::RoleNotFound(_) => Self::NotFound(message),
            PolicyError::Database(_) => Self::Database(message),
        }
    }
}
