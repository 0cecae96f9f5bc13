//! Authenticated principal claims.
//!
//! Tokens are issued by the external identity service; this crate only
//! describes and validates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{TenantId, UserId};

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Tenant the token is scoped to.
    pub tid: Uuid,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user in a tenant.
    #[must_use]
    pub fn new(user_id: Uuid, tenant_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            tid: tenant_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }

    /// Returns the tenant the principal acts in.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        TenantId::from_uuid(self.tid)
    }
}
