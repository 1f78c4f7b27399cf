mod account;
mod cache;
pub mod config;
mod error;
pub mod service;
mod store;
pub mod write_behind;

pub use account::{Account, AccountId};
pub use cache::{AccountCache, CacheEntry, CacheError, EntryState};
pub use error::DecrementError;
pub use service::{BalanceResponse, BalanceService, DecreaseBalance};
#[cfg(feature = "postgres")]
pub use store::PgAccountStore;
pub use store::{AccountRow, AccountStore, InMemoryAccountStore, StoreError};
pub use write_behind::{
    FlushStats, SchedulerState, TouchNotifier, WriteBehindConfig, WriteBehindScheduler,
};
