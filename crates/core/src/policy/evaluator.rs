//! SoD policy evaluation.
//!
//! The evaluator is pure: it reads a grant graph and a rule set and reports
//! what it finds. Callers decide whether to persist anything.

use serde::Serialize;
use std::collections::BTreeSet;

use kontor_shared::SodEnforcement;
use kontor_shared::types::{RoleId, SodRuleId, UserId};

use super::error::PolicyError;
use super::graph::RolePermissionGraph;
use super::types::{Permission, PermissionSet, SodRule};

/// A role that holds both permissions of an active rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleConflict {
    /// The conflicting role.
    pub role_id: RoleId,
    /// The triggered rule.
    pub rule_id: SodRuleId,
    /// First permission of the rule.
    pub permission_a: Permission,
    /// Second permission of the rule.
    pub permission_b: Permission,
    /// Rule description.
    pub description: String,
}

/// A user whose roles together hold both permissions of an active rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConflict {
    /// The conflicting user.
    pub user_id: UserId,
    /// The triggered rule.
    pub rule_id: SodRuleId,
    /// Roles granting the first permission.
    pub roles_a: Vec<RoleId>,
    /// Roles granting the second permission.
    pub roles_b: Vec<RoleId>,
    /// Rule description.
    pub description: String,
}

/// Every conflict found in a grant graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSet {
    /// Roles violating a rule on their own.
    pub roles: Vec<RoleConflict>,
    /// Users violating a rule across their roles.
    pub users: Vec<UserConflict>,
}

impl ConflictSet {
    /// Returns true if nothing was flagged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.users.is_empty()
    }

    /// Total number of flagged conflicts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len() + self.users.len()
    }

    /// Distinct rules that were triggered.
    #[must_use]
    pub fn triggered_rules(&self) -> BTreeSet<SodRuleId> {
        self.roles
            .iter()
            .map(|c| c.rule_id)
            .chain(self.users.iter().map(|c| c.rule_id))
            .collect()
    }

    /// Conflicts present here but not in `before`.
    #[must_use]
    pub fn difference(&self, before: &Self) -> Self {
        let old_roles: BTreeSet<_> = before.roles.iter().map(|c| (c.role_id, c.rule_id)).collect();
        let old_users: BTreeSet<_> = before.users.iter().map(|c| (c.user_id, c.rule_id)).collect();
        Self {
            roles: self
                .roles
                .iter()
                .filter(|c| !old_roles.contains(&(c.role_id, c.rule_id)))
                .cloned()
                .collect(),
            users: self
                .users
                .iter()
                .filter(|c| !old_users.contains(&(c.user_id, c.rule_id)))
                .cloned()
                .collect(),
        }
    }
}

/// A grant about to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantChange {
    /// Give a role a permission.
    RolePermission {
        /// Target role.
        role: RoleId,
        /// Permission to grant.
        permission: Permission,
    },
    /// Give a user a role.
    UserRole {
        /// Target user.
        user: UserId,
        /// Role to assign.
        role: RoleId,
    },
}

/// Result of a grant check that did not block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    /// No new conflicts.
    Clean,
    /// New conflicts exist but enforcement only warns.
    Warned(ConflictSet),
}

/// A step already performed on the entity being acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorStep {
    /// Who performed it.
    pub actor: UserId,
    /// The permission they exercised.
    pub permission: Permission,
}

/// Inputs for an action-time check.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// The principal acting now.
    pub actor: UserId,
    /// The permission being exercised now.
    pub permission: Permission,
    /// Users who prepared the entity (creator, submitter).
    pub makers: &'a [UserId],
    /// Steps already taken on the entity.
    pub prior_steps: &'a [PriorStep],
}

/// Stateless SoD policy evaluator.
pub struct PolicyEvaluator;

impl PolicyEvaluator {
    /// Finds every role and user holding both permissions of an active rule.
    #[must_use]
    pub fn evaluate(graph: &RolePermissionGraph, rules: &[SodRule]) -> ConflictSet {
        let active: Vec<&SodRule> = rules.iter().filter(|r| r.is_active).collect();
        let mut conflicts = ConflictSet::default();

        for (role_id, permissions) in graph.roles() {
            for rule in active.iter().filter(|r| r.is_violated_by(permissions)) {
                conflicts.roles.push(RoleConflict {
                    role_id: *role_id,
                    rule_id: rule.id,
                    permission_a: rule.permission_a,
                    permission_b: rule.permission_b,
                    description: rule.description.clone(),
                });
            }
        }

        for user_id in graph.users() {
            let effective = graph.effective_permissions(*user_id);
            for rule in active.iter().filter(|r| r.is_violated_by(&effective)) {
                conflicts.users.push(UserConflict {
                    user_id: *user_id,
                    rule_id: rule.id,
                    roles_a: graph.roles_granting(*user_id, rule.permission_a),
                    roles_b: graph.roles_granting(*user_id, rule.permission_b),
                    description: rule.description.clone(),
                });
            }
        }

        conflicts
    }

    /// Checks a pending grant against the rules.
    ///
    /// Only conflicts introduced by the change are reported. With
    /// `SodEnforcement::Block` any such conflict is an error.
    pub fn check_grant(
        graph: &RolePermissionGraph,
        rules: &[SodRule],
        change: GrantChange,
        enforcement: SodEnforcement,
    ) -> Result<GrantOutcome, PolicyError> {
        let before = Self::evaluate(graph, rules);

        let mut proposed = graph.clone();
        match change {
            GrantChange::RolePermission { role, permission } => {
                proposed.grant_permission(role, permission);
            }
            GrantChange::UserRole { user, role } => proposed.assign_role(user, role),
        }

        let introduced = Self::evaluate(&proposed, rules).difference(&before);
        if introduced.is_empty() {
            return Ok(GrantOutcome::Clean);
        }

        match enforcement {
            SodEnforcement::Block => Err(PolicyError::GrantConflicts(introduced)),
            SodEnforcement::Warn => Ok(GrantOutcome::Warned(introduced)),
        }
    }

    /// Requires `permission` to be in the set.
    pub fn check_permission(
        permissions: &PermissionSet,
        permission: Permission,
    ) -> Result<(), PolicyError> {
        if permissions.contains(&permission) {
            Ok(())
        } else {
            Err(PolicyError::PermissionDenied(permission))
        }
    }

    /// Returns the first of `accepted` found in the set.
    pub fn check_any_permission(
        permissions: &PermissionSet,
        accepted: &[Permission],
    ) -> Result<Permission, PolicyError> {
        accepted
            .iter()
            .copied()
            .find(|p| permissions.contains(p))
            .ok_or_else(|| {
                PolicyError::PermissionDenied(
                    accepted.first().copied().unwrap_or(Permission::JournalPost),
                )
            })
    }

    /// Action-time maker-checker and SoD check. Always blocking.
    ///
    /// Approving is refused to any maker of the entity. Any action is refused
    /// when the actor already exercised, on the same entity, a permission that
    /// forms an active rule with the one exercised now.
    pub fn check_action(ctx: &ActionContext<'_>, rules: &[SodRule]) -> Result<(), PolicyError> {
        if ctx.permission == Permission::JournalApprove && ctx.makers.contains(&ctx.actor) {
            return Err(PolicyError::MakerChecker { actor: ctx.actor });
        }

        for step in ctx.prior_steps.iter().filter(|s| s.actor == ctx.actor) {
            if let Some(rule) = rules
                .iter()
                .find(|r| r.is_active && r.pairs(step.permission, ctx.permission))
            {
                return Err(PolicyError::RuleViolated {
                    rule_id: rule.id,
                    description: rule.description.clone(),
                });
            }
        }

        Ok(())
    }
}
