//! SoD administration routes: permission catalog, roles, grants and conflicts.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use kontor_core::audit::AuditAction;
use kontor_core::policy::{ConflictSet, GrantOutcome, Permission, PermissionSet, PolicyError};
use kontor_db::{CreateRoleInput, PolicyRepository, RoleWithPermissions};
use kontor_shared::types::{RoleId, UserId};

use crate::audit::Audit;
use crate::error::ApiError;
use crate::{AppState, middleware::AuthUser};

/// Creates the SoD administration routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/permissions", get(list_permissions))
        .route("/roles", get(list_roles).post(create_role))
        .route("/roles/{role_id}/permissions", post(grant_permission))
        .route("/users/{user_id}/roles", post(assign_role))
        .route("/users/{user_id}/permissions", get(user_permissions))
        .route("/sod/conflicts", get(list_conflicts))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Catalog entry.
#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    /// Stable permission code.
    pub code: &'static str,
    /// What the permission allows.
    pub description: &'static str,
}

impl From<Permission> for PermissionResponse {
    fn from(p: Permission) -> Self {
        Self {
            code: p.code(),
            description: p.description(),
        }
    }
}

/// Request body for creating a role.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    /// Role name, unique per tenant.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// A role with its granted permissions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    /// Role ID.
    pub id: Uuid,
    /// Role name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Granted permission codes.
    pub permissions: Vec<&'static str>,
}

impl From<RoleWithPermissions> for RoleResponse {
    fn from(r: RoleWithPermissions) -> Self {
        Self {
            id: r.role.id,
            name: r.role.name,
            description: r.role.description,
            permissions: r.permissions.iter().map(Permission::code).collect(),
        }
    }
}

/// Request body for granting a permission to a role.
#[derive(Debug, Deserialize)]
pub struct GrantPermissionRequest {
    /// Permission code, e.g. `journal.approve`.
    pub permission: String,
}

/// Request body for assigning a role to a user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    /// Role to assign.
    pub role_id: RoleId,
}

/// Result of a grant that was written.
#[derive(Debug, Serialize)]
pub struct GrantResponse {
    /// Always true; blocked grants are errors.
    pub granted: bool,
    /// Conflicts the grant introduced under warn-only enforcement.
    pub warnings: ConflictSet,
}

impl From<GrantOutcome> for GrantResponse {
    fn from(outcome: GrantOutcome) -> Self {
        let warnings = match outcome {
            GrantOutcome::Clean => ConflictSet::default(),
            GrantOutcome::Warned(conflicts) => conflicts,
        };
        Self {
            granted: true,
            warnings,
        }
    }
}

fn repo(state: &AppState) -> PolicyRepository {
    PolicyRepository::new((*state.db).clone())
}

/// Audit context for a grant: the conflicts that blocked or warned.
fn grant_detail(base: serde_json::Value, result: &Result<GrantOutcome, PolicyError>) -> serde_json::Value {
    let conflicts = match result {
        Ok(GrantOutcome::Warned(conflicts)) | Err(PolicyError::GrantConflicts(conflicts)) => {
            Some(conflicts)
        }
        _ => None,
    };
    match (base, conflicts) {
        (serde_json::Value::Object(mut map), Some(conflicts)) => {
            map.insert("conflicts".to_string(), json!(conflicts));
            serde_json::Value::Object(map)
        }
        (base, _) => base,
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/permissions` - The permission catalog.
async fn list_permissions(_auth: AuthUser) -> Json<Vec<PermissionResponse>> {
    Json(Permission::ALL.into_iter().map(Into::into).collect())
}

/// GET `/roles` - Roles with their permissions.
async fn list_roles(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    let roles = repo(&state).list_roles(auth.tenant_id()).await?;
    Ok(Json(roles.into_iter().map(Into::into).collect()))
}

/// POST `/roles` - Create an empty role.
async fn create_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleResponse>), ApiError> {
    let input = CreateRoleInput {
        name: payload.name,
        description: payload.description,
    };
    let result = repo(&state)
        .create_role(auth.tenant_id(), auth.user_id(), input)
        .await;
    let role = Audit::create(&state, &auth, AuditAction::RoleCreate)
        .finish_created(result, |r| r.id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(
            RoleWithPermissions {
                role,
                permissions: PermissionSet::new(),
            }
            .into(),
        ),
    ))
}

/// POST `/roles/{role_id}/permissions` - Grant a permission after SoD evaluation.
async fn grant_permission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(role_id): Path<RoleId>,
    Json(payload): Json<GrantPermissionRequest>,
) -> Result<Json<GrantResponse>, ApiError> {
    let base = json!({ "permission": payload.permission });
    let result = match Permission::parse(&payload.permission) {
        Some(permission) => {
            repo(&state)
                .grant_permission(
                    auth.tenant_id(),
                    auth.user_id(),
                    role_id,
                    permission,
                    state.ledger.sod_enforcement,
                )
                .await
        }
        None => Err(PolicyError::UnknownPermission(payload.permission)),
    };
    let outcome = Audit::new(&state, &auth, AuditAction::GrantPermission, role_id.into_inner())
        .detail(grant_detail(base, &result))
        .finish(result)
        .await?;
    Ok(Json(outcome.into()))
}

/// POST `/users/{user_id}/roles` - Assign a role after SoD evaluation.
async fn assign_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<UserId>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<Json<GrantResponse>, ApiError> {
    let result = repo(&state)
        .assign_role(
            auth.tenant_id(),
            auth.user_id(),
            user_id,
            payload.role_id,
            state.ledger.sod_enforcement,
        )
        .await;
    let base = json!({ "roleId": payload.role_id });
    let outcome = Audit::new(&state, &auth, AuditAction::AssignRole, user_id.into_inner())
        .detail(grant_detail(base, &result))
        .finish(result)
        .await?;
    Ok(Json(outcome.into()))
}

/// GET `/users/{user_id}/permissions` - Effective permissions of a user.
async fn user_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<&'static str>>, ApiError> {
    let permissions = repo(&state)
        .effective_permissions(auth.tenant_id(), user_id)
        .await?;
    Ok(Json(permissions.iter().map(Permission::code).collect()))
}

/// GET `/sod/conflicts` - Every rule violation in the tenant's current grants.
async fn list_conflicts(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ConflictSet>, ApiError> {
    let conflicts = repo(&state).conflicts(auth.tenant_id()).await?;
    Ok(Json(conflicts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_every_permission() {
        let catalog: Vec<PermissionResponse> =
            Permission::ALL.into_iter().map(Into::into).collect();
        assert_eq!(catalog.len(), Permission::ALL.len());
        assert!(catalog.iter().any(|p| p.code == "journal.final_post"));
    }

    #[test]
    fn test_clean_grant_has_no_warnings() {
        let response = GrantResponse::from(GrantOutcome::Clean);
        assert!(response.granted);
        assert!(response.warnings.is_empty());
    }

    #[test]
    fn test_grant_detail_keeps_base_without_conflicts() {
        let base = json!({ "permission": "journal.post" });
        let detail = grant_detail(base.clone(), &Ok(GrantOutcome::Clean));
        assert_eq!(detail, base);
    }

    #[test]
    fn test_grant_detail_records_blocking_conflicts() {
        let base = json!({ "permission": "journal.post" });
        let detail = grant_detail(
            base,
            &Err(PolicyError::GrantConflicts(ConflictSet::default())),
        );
        assert!(detail.get("conflicts").is_some());
        assert_eq!(detail["permission"], "journal.post");
    }
}
