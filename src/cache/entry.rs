use std::sync::{Arc, Mutex};

use super::CacheError;
use crate::account::{Account, AccountId};
use crate::store::AccountStore;

/// Observable state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Never loaded, or the last load failed.
    Unloaded,
    /// A loader holds the entry's loader lock and is reading the store.
    Loading,
    /// Hydrated. Never reverts.
    Loaded,
    /// The store had no row for this id. Never reverts.
    Absent,
}

enum Slot {
    Unloaded,
    Loading,
    Loaded(Arc<Account>),
    Absent,
}

impl Slot {
    fn state(&self) -> EntryState {
        match self {
            Slot::Unloaded => EntryState::Unloaded,
            Slot::Loading => EntryState::Loading,
            Slot::Loaded(_) => EntryState::Loaded,
            Slot::Absent => EntryState::Absent,
        }
    }

    /// `Some` once the entry is settled either way.
    fn resolved(&self) -> Option<Option<Arc<Account>>> {
        match self {
            Slot::Loaded(account) => Some(Some(Arc::clone(account))),
            Slot::Absent => Some(None),
            Slot::Unloaded | Slot::Loading => None,
        }
    }
}

/// One cached id.
///
/// `slot` is only ever held for a pointer swap. `loader` is held across the
/// store read, so concurrent first accessors of the same id queue behind a
/// single read while other ids proceed independently.
pub struct CacheEntry {
    slot: Mutex<Slot>,
    loader: tokio::sync::Mutex<()>,
}

impl CacheEntry {
    pub fn new() -> Self {
        CacheEntry {
            slot: Mutex::new(Slot::Unloaded),
            loader: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> Result<EntryState, CacheError> {
        Ok(self.slot()?.state())
    }

    /// The loaded account, if any, without touching the store.
    pub fn loaded(&self) -> Result<Option<Arc<Account>>, CacheError> {
        Ok(self.slot()?.resolved().flatten())
    }

    /// Resolve the entry, reading the store at most once across all callers.
    ///
    /// Returns `Ok(None)` when the store has no row for `id`; that answer is
    /// cached permanently.
    pub async fn resolve<S>(
        &self,
        id: AccountId,
        store: &S,
    ) -> Result<Option<Arc<Account>>, CacheError>
    where
        S: AccountStore + ?Sized,
    {
        let settled = self.slot()?.resolved();
        if let Some(resolved) = settled {
            return Ok(resolved);
        }

        let _loader = self.loader.lock().await;

        // Another caller may have finished loading while we queued. A
        // `Loading` slot seen here belongs to a loader whose future was
        // dropped mid-read, so it is treated as unloaded.
        let settled = self.slot()?.resolved();
        if let Some(resolved) = settled {
            return Ok(resolved);
        }
        self.set(Slot::Loading)?;

        match store.read_by_id(id).await {
            Ok(Some(row)) => {
                let account = Arc::new(Account::new(row.id, row.balance));
                self.set(Slot::Loaded(Arc::clone(&account)))?;
                Ok(Some(account))
            }
            Ok(None) => {
                self.set(Slot::Absent)?;
                Ok(None)
            }
            Err(source) => {
                self.set(Slot::Unloaded)?;
                Err(CacheError::Load { id, source })
            }
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Slot>, CacheError> {
        self.slot
            .lock()
            .map_err(|_| CacheError::LockPoisoned("entry slot"))
    }

    fn set(&self, next: Slot) -> Result<(), CacheError> {
        *self.slot()? = next;
        Ok(())
    }
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self::new()
    }
}
