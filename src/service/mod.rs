//! Balance service: the request-level decrement use case.
//!
//! `BalanceService` validates a request, resolves the account through the
//! cache, applies the guarded decrement and reports the touch to the
//! write-behind scheduler. It never talks to the store directly.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use balance_cache::{AccountCache, BalanceService, InMemoryAccountStore,
//!     WriteBehindConfig, WriteBehindScheduler};
//!
//! let cache = Arc::new(AccountCache::new(InMemoryAccountStore::with_rows([(7, 10_000)])));
//! let scheduler = WriteBehindScheduler::start(cache.clone(), WriteBehindConfig::default())?;
//! let service = BalanceService::new(cache, scheduler.notifier());
//!
//! let balance = service.decrease(7, 4_000).await?;
//! assert_eq!(balance, 6_000);
//! ```

mod balance_service;
#[cfg(feature = "http")]
mod http;
mod response;

pub use balance_service::{BalanceService, DecreaseBalance};
#[cfg(feature = "http")]
pub use http::{router, serve};
pub use response::BalanceResponse;
