use thiserror::Error;

/// Failure talking to the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// An in-process store lock was poisoned.
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
