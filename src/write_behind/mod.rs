//! Write-behind persistence of cached accounts.
//!
//! Successful mutations only notify the scheduler with the touched id. A
//! single background task records the last touch time per id and, on every
//! timer tick, writes back the current in-memory balance of each account
//! that has been quiet for at least the staleness window.
//!
//! ## Guarantees
//!
//! Persistence is best effort and at most once per dirty period:
//! - an id leaves the dirty set as soon as its update is issued, so a failed
//!   write is not retried until the account is touched again;
//! - notifications are dropped (and counted) when the queue is full;
//! - stopping the scheduler does not flush the dirty set, so changes made
//!   within the last staleness window before shutdown never reach the store.

mod config;
mod dirty_set;
mod scheduler;

pub use config::{ConfigError, WriteBehindConfig};
pub use scheduler::{FlushStats, SchedulerState, TouchNotifier, WriteBehindScheduler};
