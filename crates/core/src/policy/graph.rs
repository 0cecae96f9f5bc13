//! Tenant grant graph: roles hold permissions, users hold roles.

use std::collections::{BTreeMap, BTreeSet};

use kontor_shared::types::{RoleId, UserId};

use super::types::{Permission, PermissionSet};

/// Snapshot of a tenant's role/permission and user/role grants.
#[derive(Debug, Clone, Default)]
pub struct RolePermissionGraph {
    role_permissions: BTreeMap<RoleId, PermissionSet>,
    user_roles: BTreeMap<UserId, BTreeSet<RoleId>>,
}

impl RolePermissionGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `role` holds `permission`.
    pub fn grant_permission(&mut self, role: RoleId, permission: Permission) {
        self.role_permissions.entry(role).or_default().insert(permission);
    }

    /// Records that `user` holds `role`.
    pub fn assign_role(&mut self, user: UserId, role: RoleId) {
        self.role_permissions.entry(role).or_default();
        self.user_roles.entry(user).or_default().insert(role);
    }

    /// Permissions held directly by a role.
    #[must_use]
    pub fn role_permissions(&self, role: RoleId) -> PermissionSet {
        self.role_permissions.get(&role).cloned().unwrap_or_default()
    }

    /// Roles assigned to a user.
    #[must_use]
    pub fn user_roles(&self, user: UserId) -> BTreeSet<RoleId> {
        self.user_roles.get(&user).cloned().unwrap_or_default()
    }

    /// Union of the permissions of every role the user holds.
    #[must_use]
    pub fn effective_permissions(&self, user: UserId) -> PermissionSet {
        self.user_roles(user)
            .into_iter()
            .flat_map(|role| self.role_permissions(role))
            .collect()
    }

    /// Roles of `user` that hold `permission`.
    #[must_use]
    pub fn roles_granting(&self, user: UserId, permission: Permission) -> Vec<RoleId> {
        self.user_roles(user)
            .into_iter()
            .filter(|role| self.role_permissions(*role).contains(&permission))
            .collect()
    }

    /// Iterates over every role in the graph.
    pub fn roles(&self) -> impl Iterator<Item = (&RoleId, &PermissionSet)> {
        self.role_permissions.iter()
    }

    /// Iterates over every user in the graph.
    pub fn users(&self) -> impl Iterator<Item = &UserId> {
        self.user_roles.keys()
    }
}
