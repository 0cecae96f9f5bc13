//! Permission catalog and segregation-of-duties policy.
//!
//! # Modules
//!
//! - `types` - The closed permission catalog and SoD rules
//! - `graph` - Tenant role/permission/user grant graph
//! - `evaluator` - Conflict detection and action-time checks
//! - `error` - Policy-specific error types

pub mod error;
pub mod evaluator;
pub mod graph;
pub mod types;

#[cfg(test)]
mod evaluator_props;

pub use error::PolicyError;
pub use evaluator::{
    ActionContext, ConflictSet, GrantChange, GrantOutcome, PolicyEvaluator, PriorStep,
    RoleConflict, UserConflict,
};
pub use graph::RolePermissionGraph;
pub use types::{Permission, PermissionSet, SodRule};
