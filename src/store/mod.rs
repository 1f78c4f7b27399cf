//! Durable account storage.
//!
//! The cache only needs two point operations from the backing store: read
//! a row by id and overwrite a row's balance. `AccountStore` captures that
//! seam; `PgAccountStore` is the production adapter and
//! `InMemoryAccountStore` backs tests and embedded use.

mod error;
mod in_memory;
#[cfg(feature = "postgres")]
mod postgres;
mod store;

pub use error::StoreError;
pub use in_memory::InMemoryAccountStore;
#[cfg(feature = "postgres")]
pub use postgres::PgAccountStore;
pub use store::{AccountRow, AccountStore};
