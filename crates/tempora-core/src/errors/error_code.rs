//! TemporaErrorCode trait for callers that branch on error kind.

/// Every error enum implements this to expose a stable, machine-readable code.
pub trait TemporaErrorCode {
    /// Returns the error code string (e.g., "COMPILE_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const INTERVAL_ERROR: &str = "INTERVAL_ERROR";
pub const DATA_SOURCE_READ_ERROR: &str = "DATA_SOURCE_READ_ERROR";
pub const KNOWLEDGE_SOURCE_READ_ERROR: &str = "KNOWLEDGE_SOURCE_READ_ERROR";
pub const ALGORITHM_SOURCE_READ_ERROR: &str = "ALGORITHM_SOURCE_READ_ERROR";
pub const ALGORITHM_ERROR: &str = "ALGORITHM_ERROR";
pub const COMPILE_ERROR: &str = "COMPILE_ERROR";
pub const CYCLIC_DEPENDENCY: &str = "CYCLIC_DEPENDENCY";
pub const EXECUTION_ERROR: &str = "EXECUTION_ERROR";
pub const STORE_ERROR: &str = "STORE_ERROR";
pub const RESULT_HANDLER_ERROR: &str = "RESULT_HANDLER_ERROR";
pub const CLOSE_ERROR: &str = "CLOSE_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const FINDER_ERROR: &str = "FINDER_ERROR";
pub const PIPELINE_ERROR: &str = "PIPELINE_ERROR";
pub const CANCELLED: &str = "CANCELLED";
