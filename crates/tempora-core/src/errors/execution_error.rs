//! Per-key execution errors. These abort the current key only.

use super::error_code::{self, TemporaErrorCode};
use super::{AlgorithmError, IntervalError, StoreError};

/// Errors raised while running rules for one key.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("algorithm {algorithm_id} failed for {definition_id}: {source}")]
    Algorithm {
        definition_id: String,
        algorithm_id: String,
        #[source]
        source: AlgorithmError,
    },

    #[error("key {key_id} exceeded {limit} rule firings")]
    FiringLimitExceeded { key_id: String, limit: usize },

    #[error("derived interval for {definition_id} is invalid: {source}")]
    DerivedInterval {
        definition_id: String,
        #[source]
        source: IntervalError,
    },

    #[error("working state store error: {0}")]
    Store(#[from] StoreError),

    #[error("corrupt working state for key {key_id}: {details}")]
    CorruptState { key_id: String, details: String },
}

impl TemporaErrorCode for ExecutionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.error_code(),
            _ => error_code::EXECUTION_ERROR,
        }
    }
}
