//! Read-only chart-of-accounts access.
//!
//! The chart is owned by another module; posting only needs to know whether
//! an account exists, is active, accepts direct postings and whether it is
//! reserved for final posting.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

use kontor_core::ledger::{AccountInfo, JournalLineInput};
use kontor_shared::types::{AccountId, TenantId};

use crate::entities::accounts;

/// The subset of the chart of accounts referenced by an operation.
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    accounts: HashMap<AccountId, AccountInfo>,
}

impl ChartOfAccounts {
    /// Loads the given accounts of a tenant. Missing ids are simply absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn load<C: ConnectionTrait>(
        conn: &C,
        tenant_id: TenantId,
        account_ids: impl IntoIterator<Item = AccountId>,
    ) -> Result<Self, DbErr> {
        let ids: Vec<_> = account_ids.into_iter().map(AccountId::into_inner).collect();
        if ids.is_empty() {
            return Ok(Self::default());
        }

        let rows = accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(accounts::Column::Id.is_in(ids))
            .all(conn)
            .await?;

        Ok(Self {
            accounts: rows
                .into_iter()
                .map(|row| {
                    let info = to_account_info(&row);
                    (info.id, info)
                })
                .collect(),
        })
    }

    /// Loads every account referenced by `lines` plus any `extra` accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn for_lines<C: ConnectionTrait>(
        conn: &C,
        tenant_id: TenantId,
        lines: &[JournalLineInput],
        extra: &[AccountId],
    ) -> Result<Self, DbErr> {
        let ids = lines
            .iter()
            .map(|line| line.account_id)
            .chain(extra.iter().copied());
        Self::load(conn, tenant_id, ids).await
    }

    /// Looks up one account.
    #[must_use]
    pub fn lookup(&self, account_id: AccountId) -> Option<AccountInfo> {
        self.accounts.get(&account_id).cloned()
    }
}

/// Maps a chart row to the validator's view of it.
#[must_use]
pub fn to_account_info(row: &accounts::Model) -> AccountInfo {
    AccountInfo {
        id: AccountId::from_uuid(row.id),
        account_type: row.account_type.into(),
        is_active: row.is_active,
        allow_direct_posting: row.allow_direct_posting,
        requires_final_post: row.requires_final_post,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums::AccountType;
    use kontor_core::ledger::AccountType as CoreAccountType;
    use uuid::Uuid;

    #[test]
    fn test_to_account_info() {
        let id = Uuid::now_v7();
        let row = accounts::Model {
            id,
            tenant_id: Uuid::now_v7(),
            code: "2100".into(),
            name: "Accounts Payable".into(),
            account_type: AccountType::Liability,
            is_active: true,
            allow_direct_posting: false,
            requires_final_post: true,
            created_at: chrono::Utc::now().into(),
        };

        let info = to_account_info(&row);
        assert_eq!(info.id, AccountId::from_uuid(id));
        assert_eq!(info.account_type, CoreAccountType::Liability);
        assert!(!info.allow_direct_posting);
        assert!(info.requires_final_post);
    }

    #[test]
    fn test_lookup_missing_account() {
        assert!(ChartOfAccounts::default().lookup(AccountId::new()).is_none());
    }
}
