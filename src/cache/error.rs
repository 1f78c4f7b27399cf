use thiserror::Error;

use crate::account::AccountId;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The first-access read failed; the entry stays unloaded so a later
    /// call retries.
    #[error("failed to load account {id}: {source}")]
    Load {
        id: AccountId,
        #[source]
        source: StoreError,
    },
    #[error("cache lock poisoned during {0}")]
    LockPoisoned(&'static str),
}
