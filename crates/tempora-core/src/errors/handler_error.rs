//! Result-delivery errors raised by the destination.

use super::error_code::{self, TemporaErrorCode};

/// Errors raised by a `QueryResultsHandler`. Any of them cancels the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ResultHandlerError {
    #[error("result handler failed processing key {key_id}: {message}")]
    Processing { key_id: String, message: String },

    #[error("result handler panicked: {message}")]
    Panicked { message: String },

    #[error("result handler failed to {phase}: {message}")]
    Lifecycle { phase: String, message: String },
}

impl TemporaErrorCode for ResultHandlerError {
    fn error_code(&self) -> &'static str {
        error_code::RESULT_HANDLER_ERROR
    }
}
