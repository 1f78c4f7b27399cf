use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::DecrementError;

/// Store-assigned account identifier.
pub type AccountId = i64;

/// In-memory mirror of one `users` row.
///
/// The id is immutable. The balance is the only mutable field and is guarded
/// by the account's own mutex: every read-modify-write of the balance happens
/// with that lock held, and no I/O is ever performed under it.
pub struct Account {
    id: AccountId,
    balance: Mutex<i64>,
}

impl Account {
    pub fn new(id: AccountId, balance: i64) -> Self {
        Account {
            id,
            balance: Mutex::new(balance),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Current balance as seen by the last committed mutation.
    pub fn balance(&self) -> i64 {
        *self.guard()
    }

    /// Decrease the balance by `amount`, returning the new balance.
    ///
    /// Fails with `InsufficientFunds` when the balance is zero or smaller than
    /// `amount`; the balance is not touched in that case. Callers validate
    /// `amount >= 1` beforehand.
    pub fn decrease(&self, amount: i64) -> Result<i64, DecrementError> {
        let mut balance = self.guard();
        if *balance == 0 || *balance < amount {
            return Err(DecrementError::InsufficientFunds {
                balance: *balance,
                amount,
            });
        }
        *balance -= amount;
        Ok(*balance)
    }

    // A panic while holding the lock cannot leave a torn balance, so a
    // poisoned guard is still safe to use.
    fn guard(&self) -> MutexGuard<'_, i64> {
        self.balance.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("balance", &self.balance())
            .finish()
    }
}
