//! Persistent key-value store errors.

use super::error_code::{self, TemporaErrorCode};

/// Storage-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error in store {store}: {message}")]
    Sqlite { store: String, message: String },

    #[error("serialization failed in store {store}: {message}")]
    Serialization { store: String, message: String },

    #[error("store {store} is shut down")]
    Closed { store: String },

    #[error("store {store} lock poisoned")]
    Poisoned { store: String },

    #[error("could not open store at {path}: {message}")]
    Open { path: String, message: String },
}

impl TemporaErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        error_code::STORE_ERROR
    }
}
