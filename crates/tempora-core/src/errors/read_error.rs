//! Read errors raised by the external sources.

use super::error_code::{self, TemporaErrorCode};

/// Errors reading raw propositions from a backend.
#[derive(Debug, thiserror::Error)]
pub enum DataSourceReadError {
    #[error("data source {source_name} failed: {message}")]
    Backend {
        source_name: String,
        message: String,
    },

    #[error("iterator {iterator} failed while positioned at key {key_id}: {message}")]
    MidKey {
        iterator: usize,
        key_id: String,
        message: String,
    },

    #[error("iterator {iterator} emitted key {key_id} after {previous}; keys must be sorted")]
    OutOfOrder {
        iterator: usize,
        key_id: String,
        previous: String,
    },
}

impl TemporaErrorCode for DataSourceReadError {
    fn error_code(&self) -> &'static str {
        error_code::DATA_SOURCE_READ_ERROR
    }
}

/// Errors resolving definitions from the knowledge source.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeSourceReadError {
    #[error("knowledge source failed reading {id}: {message}")]
    Backend { id: String, message: String },
}

impl TemporaErrorCode for KnowledgeSourceReadError {
    fn error_code(&self) -> &'static str {
        error_code::KNOWLEDGE_SOURCE_READ_ERROR
    }
}

/// Errors resolving algorithms.
#[derive(Debug, thiserror::Error)]
pub enum AlgorithmSourceReadError {
    #[error("algorithm source failed reading {id}: {message}")]
    Backend { id: String, message: String },
}

impl TemporaErrorCode for AlgorithmSourceReadError {
    fn error_code(&self) -> &'static str {
        error_code::ALGORITHM_SOURCE_READ_ERROR
    }
}
