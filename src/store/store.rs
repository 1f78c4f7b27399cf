use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::account::AccountId;

/// One persisted account row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct AccountRow {
    pub id: AccountId,
    pub balance: i64,
}

/// Point reads and point balance updates against durable storage.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Read a row by id. `Ok(None)` means the store has no such account.
    async fn read_by_id(&self, id: AccountId) -> Result<Option<AccountRow>, StoreError>;

    /// Overwrite the persisted balance of `id`.
    async fn update_balance(&self, id: AccountId, balance: i64) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: AccountStore + ?Sized> AccountStore for std::sync::Arc<S> {
    async fn read_by_id(&self, id: AccountId) -> Result<Option<AccountRow>, StoreError> {
        (**self).read_by_id(id).await
    }

    async fn update_balance(&self, id: AccountId, balance: i64) -> Result<(), StoreError> {
        (**self).update_balance(id, balance).await
    }
}
