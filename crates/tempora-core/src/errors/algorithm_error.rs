//! Errors raised by algorithm implementations.

use super::error_code::{self, TemporaErrorCode};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlgorithmError {
    #[error("invalid argument {parameter}: {message}")]
    InvalidArgument { parameter: String, message: String },

    #[error("proposition {proposition_id} has no numeric value")]
    NonNumeric { proposition_id: String },

    #[error("{0}")]
    Failed(String),
}

impl TemporaErrorCode for AlgorithmError {
    fn error_code(&self) -> &'static str {
        error_code::ALGORITHM_ERROR
    }
}
