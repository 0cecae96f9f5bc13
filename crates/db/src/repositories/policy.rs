//! Role grants, SoD rules and effective permission resolution.
//!
//! The loaders at the top of this module are shared with the other
//! repositories, which resolve the actor's permissions inside their own
//! tenant transaction.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, warn};
use uuid::Uuid;

use kontor_core::policy::{
    ConflictSet, GrantChange, GrantOutcome, Permission, PermissionSet, PolicyError,
    PolicyEvaluator, RolePermissionGraph, SodRule,
};
use kontor_shared::SodEnforcement;
use kontor_shared::types::{RoleId, SodRuleId, TenantId, UserId};

use crate::entities::{role_permissions, roles, sod_rules, user_roles};
use crate::tenant::TenantTransaction;

const GRANT_LOCK_SCOPE: &str = "kontor.grants";

/// Loads the active and inactive SoD rules visible to the tenant: its own
/// rules plus the shared baseline.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn load_rules<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
) -> Result<Vec<SodRule>, DbErr> {
    let rows = sod_rules::Entity::find()
        .filter(
            Condition::any()
                .add(sod_rules::Column::TenantId.eq(tenant_id.into_inner()))
                .add(sod_rules::Column::TenantId.is_null()),
        )
        .order_by_asc(sod_rules::Column::CreatedAt)
        .all(conn)
        .await?;

    Ok(rows.into_iter().filter_map(to_sod_rule).collect())
}

/// Resolves a user's effective permissions through their roles.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn load_permissions<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    user_id: UserId,
) -> Result<PermissionSet, DbErr> {
    let role_ids: Vec<Uuid> = user_roles::Entity::find()
        .filter(user_roles::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(user_roles::Column::UserId.eq(user_id.into_inner()))
        .all(conn)
        .await?
        .into_iter()
        .map(|row| row.role_id)
        .collect();

    if role_ids.is_empty() {
        return Ok(PermissionSet::new());
    }

    let grants = role_permissions::Entity::find()
        .filter(role_permissions::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(role_permissions::Column::RoleId.is_in(role_ids))
        .all(conn)
        .await?;

    Ok(grants
        .iter()
        .filter_map(|grant| parse_permission(&grant.permission))
        .collect())
}

/// Loads the tenant's full grant graph.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn load_graph<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
) -> Result<RolePermissionGraph, DbErr> {
    let mut graph = RolePermissionGraph::new();

    let grants = role_permissions::Entity::find()
        .filter(role_permissions::Column::TenantId.eq(tenant_id.into_inner()))
        .all(conn)
        .await?;
    for grant in &grants {
        if let Some(permission) = parse_permission(&grant.permission) {
            graph.grant_permission(RoleId::from_uuid(grant.role_id), permission);
        }
    }

    let assignments = user_roles::Entity::find()
        .filter(user_roles::Column::TenantId.eq(tenant_id.into_inner()))
        .all(conn)
        .await?;
    for assignment in &assignments {
        graph.assign_role(
            UserId::from_uuid(assignment.user_id),
            RoleId::from_uuid(assignment.role_id),
        );
    }

    Ok(graph)
}

fn parse_permission(code: &str) -> Option<Permission> {
    let permission = Permission::parse(code);
    if permission.is_none() {
        warn!(code, "Ignoring grant of unknown permission code");
    }
    permission
}

fn to_sod_rule(row: sod_rules::Model) -> Option<SodRule> {
    Some(SodRule {
        id: SodRuleId::from_uuid(row.id),
        permission_a: parse_permission(&row.permission_a)?,
        permission_b: parse_permission(&row.permission_b)?,
        description: row.description,
        is_active: row.is_active,
    })
}

fn db_error(err: DbErr) -> PolicyError {
    PolicyError::Database(err.to_string())
}

/// Input for creating a role.
#[derive(Debug, Clone)]
pub struct CreateRoleInput {
    /// Role name, unique per tenant.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// A role with the permissions it holds.
#[derive(Debug, Clone)]
pub struct RoleWithPermissions {
    /// The role record.
    pub role: roles::Model,
    /// Granted permissions.
    pub permissions: PermissionSet,
}

/// Repository for role administration and SoD queries.
#[derive(Debug, Clone)]
pub struct PolicyRepository {
    db: DatabaseConnection,
}

impl PolicyRepository {
    /// Creates a new policy repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns a user's effective permissions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn effective_permissions(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Result<PermissionSet, PolicyError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let permissions = load_permissions(tx.transaction(), tenant_id, user_id)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(permissions)
    }

    /// Creates an empty role.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor lacks `sod.manage` or the insert fails.
    pub async fn create_role(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        input: CreateRoleInput,
    ) -> Result<roles::Model, PolicyError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let permissions = load_permissions(tx.transaction(), tenant_id, actor)
            .await
            .map_err(db_error)?;
        PolicyEvaluator::check_permission(&permissions, Permission::SodManage)?;

        let role = roles::ActiveModel {
            id: Set(RoleId::new().into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(Utc::now().into()),
        }
        .insert(tx.transaction())
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(role)
    }

    /// Lists the tenant's roles with their permissions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_roles(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<RoleWithPermissions>, PolicyError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;

        let rows = roles::Entity::find()
            .filter(roles::Column::TenantId.eq(tenant_id.into_inner()))
            .order_by_asc(roles::Column::Name)
            .all(tx.transaction())
            .await
            .map_err(db_error)?;
        let graph = load_graph(tx.transaction(), tenant_id)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|role| RoleWithPermissions {
                permissions: graph.role_permissions(RoleId::from_uuid(role.id)),
                role,
            })
            .collect())
    }

    /// Grants a permission to a role after evaluating the change against the
    /// tenant's SoD rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor lacks `sod.manage`, the role does not
    /// exist, the grant introduces conflicts under blocking enforcement, or a
    /// database operation fails.
    pub async fn grant_permission(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        role_id: RoleId,
        permission: Permission,
        enforcement: SodEnforcement,
    ) -> Result<GrantOutcome, PolicyError> {
        let tx = self.begin_grant(tenant_id, actor, role_id).await?;
        let graph = load_graph(tx.transaction(), tenant_id)
            .await
            .map_err(db_error)?;

        if graph.role_permissions(role_id).contains(&permission) {
            tx.commit().await.map_err(db_error)?;
            return Ok(GrantOutcome::Clean);
        }

        let rules = load_rules(tx.transaction(), tenant_id)
            .await
            .map_err(db_error)?;
        let outcome = PolicyEvaluator::check_grant(
            &graph,
            &rules,
            GrantChange::RolePermission {
                role: role_id,
                permission,
            },
            enforcement,
        )
        .inspect_err(|err| {
            warn!(tenant_id = %tenant_id, role_id = %role_id, %permission, error = %err, "Grant blocked");
        })?;

        role_permissions::ActiveModel {
            role_id: Set(role_id.into_inner()),
            permission: Set(permission.code().to_string()),
            tenant_id: Set(tenant_id.into_inner()),
            granted_by: Set(actor.into_inner()),
            granted_at: Set(Utc::now().into()),
        }
        .insert(tx.transaction())
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        log_outcome(tenant_id, &outcome);
        info!(tenant_id = %tenant_id, role_id = %role_id, %permission, "Permission granted");
        Ok(outcome)
    }

    /// Assigns a role to a user after evaluating the change against the
    /// tenant's SoD rules.
    ///
    /// # Errors
    ///
    /// Same as [`Self::grant_permission`].
    pub async fn assign_role(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        user_id: UserId,
        role_id: RoleId,
        enforcement: SodEnforcement,
    ) -> Result<GrantOutcome, PolicyError> {
        let tx = self.begin_grant(tenant_id, actor, role_id).await?;
        let graph = load_graph(tx.transaction(), tenant_id)
            .await
            .map_err(db_error)?;

        if graph.user_roles(user_id).contains(&role_id) {
            tx.commit().await.map_err(db_error)?;
            return Ok(GrantOutcome::Clean);
        }

        let rules = load_rules(tx.transaction(), tenant_id)
            .await
            .map_err(db_error)?;
        let outcome = PolicyEvaluator::check_grant(
            &graph,
            &rules,
            GrantChange::UserRole {
                user: user_id,
                role: role_id,
            },
            enforcement,
        )
        .inspect_err(|err| {
            warn!(tenant_id = %tenant_id, user_id = %user_id, role_id = %role_id, error = %err, "Role assignment blocked");
        })?;

        user_roles::ActiveModel {
            user_id: Set(user_id.into_inner()),
            role_id: Set(role_id.into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            assigned_by: Set(actor.into_inner()),
            assigned_at: Set(Utc::now().into()),
        }
        .insert(tx.transaction())
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        log_outcome(tenant_id, &outcome);
        info!(tenant_id = %tenant_id, user_id = %user_id, role_id = %role_id, "Role assigned");
        Ok(outcome)
    }

    /// Evaluates every active rule against the tenant's current grants.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn conflicts(&self, tenant_id: TenantId) -> Result<ConflictSet, PolicyError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let graph = load_graph(tx.transaction(), tenant_id)
            .await
            .map_err(db_error)?;
        let rules = load_rules(tx.transaction(), tenant_id)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;

        Ok(PolicyEvaluator::evaluate(&graph, &rules))
    }

    /// Opens a grant transaction: serializes grant writers of the tenant,
    /// checks `sod.manage` and that the role exists.
    async fn begin_grant(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        role_id: RoleId,
    ) -> Result<TenantTransaction, PolicyError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        tx.advisory_lock(GRANT_LOCK_SCOPE).await.map_err(db_error)?;

        let permissions = load_permissions(tx.transaction(), tenant_id, actor)
            .await
            .map_err(db_error)?;
        PolicyEvaluator::check_permission(&permissions, Permission::SodManage)?;

        roles::Entity::find_by_id(role_id.into_inner())
            .filter(roles::Column::TenantId.eq(tenant_id.into_inner()))
            .one(tx.transaction())
            .await
            .map_err(db_error)?
            .ok_or(PolicyError::RoleNotFound(role_id))?;

        Ok(tx)
    }
}

fn log_outcome(tenant_id: TenantId, outcome: &GrantOutcome) {
    if let GrantOutcome::Warned(conflicts) = outcome {
        warn!(
            tenant_id = %tenant_id,
            conflicts = conflicts.len(),
            rules = ?conflicts.triggered_rules(),
            "Grant written with segregation of duties conflicts"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_row(a: &str, b: &str) -> sod_rules::Model {
        sod_rules::Model {
            id: Uuid::now_v7(),
            tenant_id: None,
            permission_a: a.into(),
            permission_b: b.into(),
            description: "test".into(),
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_to_sod_rule_parses_codes() {
        let rule = to_sod_rule(rule_row("journal.submit", "journal.approve")).unwrap();
        assert!(rule.pairs(Permission::JournalApprove, Permission::JournalSubmit));
        assert!(rule.is_active);
    }

    #[test]
    fn test_to_sod_rule_skips_unknown_codes() {
        assert!(to_sod_rule(rule_row("journal.submit", "journal.delete")).is_none());
    }
}
