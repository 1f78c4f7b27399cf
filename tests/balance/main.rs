//! Balance service integration tests.
//!
//! Exercises the cache, the guarded decrement and the write-behind flush
//! together:
//! - concurrent decrements on one account (no lost update, never negative)
//! - concurrent first access (one store read)
//! - staleness-driven flushing and coalescing of bursts
//! - the HTTP transport and, when a database is available, Postgres

mod write_behind;
#[cfg(feature = "http")]
mod http;
#[cfg(feature = "postgres")]
mod postgres;
