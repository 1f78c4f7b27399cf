use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::account::AccountId;

/// Last touch time of every account with unflushed changes.
///
/// Owned by the scheduler loop alone, so it needs no locking.
#[derive(Debug, Default)]
pub(crate) struct DirtySet {
    touched: HashMap<AccountId, Instant>,
}

impl DirtySet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn touch(&mut self, id: AccountId, at: Instant) {
        self.touched.insert(id, at);
    }

    /// Remove and return every id untouched for at least `staleness`, in id
    /// order.
    pub(crate) fn take_due(&mut self, now: Instant, staleness: Duration) -> Vec<AccountId> {
        let mut due: Vec<AccountId> = self
            .touched
            .iter()
            .filter(|(_, last)| now.saturating_duration_since(**last) >= staleness)
            .map(|(id, _)| *id)
            .collect();
        due.sort_unstable();
        for id in &due {
            self.touched.remove(id);
        }
        due
    }

    pub(crate) fn len(&self) -> usize {
        self.touched.len()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, id: AccountId) -> bool {
        self.touched.contains_key(&id)
    }
}
