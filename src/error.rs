use thiserror::Error;

use crate::account::AccountId;
use crate::cache::CacheError;

/// Outcome of a rejected balance decrement.
#[derive(Debug, Error)]
pub enum DecrementError {
    /// The request identifiers or amount failed basic validation.
    #[error("{0}")]
    InvalidInput(String),
    /// No account row exists for the id.
    #[error("user not found")]
    NotFound(AccountId),
    /// The balance cannot cover the amount. Balance is left unchanged.
    #[error("not enough money")]
    InsufficientFunds { balance: i64, amount: i64 },
    /// The account could not be loaded from the backing store.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] CacheError),
    /// In-process cache state is unusable, e.g. a poisoned lock.
    #[error("internal error")]
    Internal(#[source] CacheError),
}

impl DecrementError {
    /// HTTP status code for this outcome.
    pub fn status_code(&self) -> u16 {
        match self {
            DecrementError::InvalidInput(_) => 422,
            DecrementError::NotFound(_) => 404,
            DecrementError::InsufficientFunds { .. } => 400,
            DecrementError::StoreUnavailable(_) => 503,
            DecrementError::Internal(_) => 500,
        }
    }
}

impl From<CacheError> for DecrementError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Load { .. } => DecrementError::StoreUnavailable(err),
            CacheError::LockPoisoned(_) => DecrementError::Internal(err),
        }
    }
}
