//! Interval construction errors.

use super::error_code::{self, TemporaErrorCode};

/// Bounds that violate `min_start ≤ max_start ≤ max_finish`, `min_start ≤ min_finish ≤ max_finish`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    #[error("invalid interval bounds: start [{min_start}, {max_start}], finish [{min_finish}, {max_finish}]")]
    InvalidBounds {
        min_start: i64,
        max_start: i64,
        min_finish: i64,
        max_finish: i64,
    },

    #[error("interval position overflow: {0}")]
    Overflow(String),
}

impl TemporaErrorCode for IntervalError {
    fn error_code(&self) -> &'static str {
        error_code::INTERVAL_ERROR
    }
}
