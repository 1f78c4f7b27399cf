//! Process-wide account cache.
//!
//! Accounts are loaded from the store on first access and then live for
//! the rest of the process. Each id maps to a `CacheEntry`, an explicit
//! three-state cell (unloaded, loading, loaded) plus a sticky "absent"
//! marker for ids the store does not know. A per-entry loader lock makes
//! concurrent first accesses share a single store read.

mod cache;
mod entry;
mod error;

pub use cache::AccountCache;
pub use entry::{CacheEntry, EntryState};
pub use error::CacheError;
