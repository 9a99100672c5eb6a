//! Error handling for Tempora.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod algorithm_error;
pub mod close_error;
pub mod compile_error;
pub mod config_error;
pub mod error_code;
pub mod execution_error;
pub mod handler_error;
pub mod interval_error;
pub mod query_error;
pub mod read_error;
pub mod store_error;

pub use algorithm_error::AlgorithmError;
pub use close_error::CloseError;
pub use compile_error::CompileError;
pub use config_error::ConfigError;
pub use error_code::TemporaErrorCode;
pub use execution_error::ExecutionError;
pub use handler_error::ResultHandlerError;
pub use interval_error::IntervalError;
pub use query_error::{QueryError, PartialResult};
pub use read_error::{AlgorithmSourceReadError, DataSourceReadError, KnowledgeSourceReadError};
pub use store_error::StoreError;
