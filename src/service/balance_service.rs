use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::cache::AccountCache;
use crate::error::DecrementError;
use crate::store::AccountStore;
use crate::write_behind::TouchNotifier;

/// Inbound "decrease balance" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecreaseBalance {
    pub user_id: AccountId,
    pub amount: i64,
}

impl DecreaseBalance {
    pub fn validate(&self) -> Result<(), DecrementError> {
        if self.user_id < 1 {
            return Err(DecrementError::InvalidInput("invalid user id".into()));
        }
        if self.amount < 1 {
            return Err(DecrementError::InvalidInput("invalid amount".into()));
        }
        Ok(())
    }
}

pub struct BalanceService<S> {
    cache: Arc<AccountCache<S>>,
    notifier: TouchNotifier,
}

impl<S: AccountStore> BalanceService<S> {
    pub fn new(cache: Arc<AccountCache<S>>, notifier: TouchNotifier) -> Self {
        BalanceService { cache, notifier }
    }

    pub fn cache(&self) -> &Arc<AccountCache<S>> {
        &self.cache
    }

    /// Decrease the balance of `user_id` by `amount` and return the new
    /// in-memory balance.
    pub async fn decrease(&self, user_id: AccountId, amount: i64) -> Result<i64, DecrementError> {
        self.apply(DecreaseBalance { user_id, amount }).await
    }

    pub async fn apply(&self, request: DecreaseBalance) -> Result<i64, DecrementError> {
        request.validate()?;

        let account = self
            .cache
            .get(request.user_id)
            .await?
            .ok_or(DecrementError::NotFound(request.user_id))?;

        let balance = account.decrease(request.amount)?;
        self.notifier.notify(request.user_id);
        Ok(balance)
    }
}
