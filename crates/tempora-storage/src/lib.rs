//! # tempora-storage
//!
//! Per-key stores for stateful execution. `SqliteStore` keeps one table per store in a
//! shared database; `InMemoryStore` is the volatile variant. `StoreBundle` opens stores
//! according to `StorageConfig` and closes all of them exactly once.

pub mod bundle;
pub mod connection;
pub mod memory_store;
pub mod sqlite_store;

pub use bundle::StoreBundle;
pub use connection::Database;
pub use memory_store::InMemoryStore;
pub use sqlite_store::SqliteStore;

use tempora_core::errors::StoreError;

/// File name of the database inside the configured storage directory.
pub const DATABASE_FILE: &str = "tempora.db";

pub(crate) fn sqlite_err(store: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Sqlite {
        store: store.to_string(),
        message: e.to_string(),
    }
}
