use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use super::{AccountRow, AccountStore, StoreError};
use crate::account::AccountId;

/// Map-backed `AccountStore`.
///
/// Cloning yields another handle to the same rows and counters. Besides the
/// rows it records how many reads were served and every balance update in
/// the order it arrived, and it can be told to fail or to slow down reads.
#[derive(Clone, Default)]
pub struct InMemoryAccountStore {
    rows: Arc<RwLock<HashMap<AccountId, i64>>>,
    reads: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<AccountRow>>>,
    fail_reads: Arc<AtomicBool>,
    fail_updates: Arc<AtomicBool>,
    read_delay: Arc<Mutex<Option<Duration>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `(id, balance)` rows.
    pub fn with_rows(rows: impl IntoIterator<Item = (AccountId, i64)>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.rows.write() {
            map.extend(rows);
        }
        store
    }

    pub fn insert(&self, id: AccountId, balance: i64) -> Result<(), StoreError> {
        self.rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("insert"))?
            .insert(id, balance);
        Ok(())
    }

    /// Persisted balance of `id`, bypassing the read counter.
    pub fn persisted_balance(&self, id: AccountId) -> Option<i64> {
        self.rows.read().ok()?.get(&id).copied()
    }

    /// Number of `read_by_id` calls served so far, failed ones included.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Every successful balance update, oldest first.
    pub fn updates(&self) -> Vec<AccountRow> {
        self.updates
            .lock()
            .map(|updates| updates.clone())
            .unwrap_or_default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Delay every subsequent read by `delay`.
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        if let Ok(mut slot) = self.read_delay.lock() {
            *slot = delay;
        }
    }

    fn current_read_delay(&self) -> Option<Duration> {
        self.read_delay.lock().ok().and_then(|delay| *delay)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn read_by_id(&self, id: AccountId) -> Result<Option<AccountRow>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.current_read_delay() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("read of account {id} refused")));
        }
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(rows.get(&id).map(|&balance| AccountRow { id, balance }))
    }

    async fn update_balance(&self, id: AccountId, balance: i64) -> Result<(), StoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "update of account {id} refused"
            )));
        }
        self.rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("update"))?
            .entry(id)
            .and_modify(|stored| *stored = balance);
        self.updates
            .lock()
            .map_err(|_| StoreError::LockPoisoned("update log"))?
            .push(AccountRow { id, balance });
        Ok(())
    }
}
