use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{CacheEntry, CacheError, EntryState};
use crate::account::{Account, AccountId};
use crate::store::AccountStore;

/// Read-through cache from account id to a shared `Account`.
///
/// Entries are never evicted: once an id resolves to an account, every later
/// lookup returns the same `Arc` for the lifetime of the cache.
pub struct AccountCache<S> {
    store: S,
    entries: RwLock<HashMap<AccountId, Arc<CacheEntry>>>,
}

impl<S: AccountStore> AccountCache<S> {
    pub fn new(store: S) -> Self {
        AccountCache {
            store,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Access the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Look up an account, loading it from the store on first access.
    ///
    /// `Ok(None)` means the store has no such account.
    pub async fn get(&self, id: AccountId) -> Result<Option<Arc<Account>>, CacheError> {
        let entry = self.ensure_entry(id)?;
        entry.resolve(id, &self.store).await
    }

    /// The cached account for `id` if it has already been loaded.
    pub fn loaded(&self, id: AccountId) -> Result<Option<Arc<Account>>, CacheError> {
        match self.find_entry(id)? {
            Some(entry) => entry.loaded(),
            None => Ok(None),
        }
    }

    /// State of the entry for `id`, or `None` if it was never requested.
    pub fn state(&self, id: AccountId) -> Result<Option<EntryState>, CacheError> {
        match self.find_entry(id)? {
            Some(entry) => entry.state().map(Some),
            None => Ok(None),
        }
    }

    /// Number of ids that have an entry, whatever its state.
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find_entry(&self, id: AccountId) -> Result<Option<Arc<CacheEntry>>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CacheError::LockPoisoned("entries read"))?;
        Ok(entries.get(&id).cloned())
    }

    fn ensure_entry(&self, id: AccountId) -> Result<Arc<CacheEntry>, CacheError> {
        if let Some(entry) = self.find_entry(id)? {
            return Ok(entry);
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CacheError::LockPoisoned("entries write"))?;
        Ok(entries
            .entry(id)
            .or_insert_with(|| Arc::new(CacheEntry::new()))
            .clone())
    }
}
