//! Errors releasing iterators and stores.

use super::error_code::{self, TemporaErrorCode};

/// Raised after every resource was given the chance to close; carries the first failure.
#[derive(Debug, thiserror::Error)]
pub enum CloseError {
    #[error("failed closing {resource}: {message} ({failed} of {total} resources failed)")]
    Failed {
        resource: String,
        message: String,
        failed: usize,
        total: usize,
    },
}

impl TemporaErrorCode for CloseError {
    fn error_code(&self) -> &'static str {
        error_code::CLOSE_ERROR
    }
}
