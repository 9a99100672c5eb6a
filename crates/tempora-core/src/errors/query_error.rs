//! Top-level query errors and non-fatal error collection.

use super::error_code::{self, TemporaErrorCode};
use super::{
    AlgorithmSourceReadError, CloseError, CompileError, ConfigError, DataSourceReadError,
    ExecutionError, KnowledgeSourceReadError, ResultHandlerError, StoreError,
};

/// Errors surfaced to the caller of a query execution.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("data source read error: {0}")]
    DataSourceRead(#[from] DataSourceReadError),

    #[error("knowledge source read error: {0}")]
    KnowledgeSourceRead(#[from] KnowledgeSourceReadError),

    #[error("algorithm source read error: {0}")]
    AlgorithmSourceRead(#[from] AlgorithmSourceReadError),

    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("execution error: {0}")]
    Execute(#[from] ExecutionError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("result handler error: {0}")]
    ResultHandler(#[from] ResultHandlerError),

    #[error("close error: {0}")]
    Close(#[from] CloseError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("query {query_id} failed with {} error(s): {}", .errors.len(), join_messages(.errors))]
    Finder {
        query_id: String,
        errors: Vec<QueryError>,
    },

    #[error("pipeline thread {name} failed: {message}")]
    Thread { name: String, message: String },

    #[error("query cancelled")]
    Cancelled,
}

fn join_messages(errors: &[QueryError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl QueryError {
    /// The aggregated errors when this is a `Finder` error, otherwise just `self`.
    pub fn causes(&self) -> Vec<&QueryError> {
        match self {
            Self::Finder { errors, .. } => errors.iter().collect(),
            other => vec![other],
        }
    }
}

impl TemporaErrorCode for QueryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DataSourceRead(e) => e.error_code(),
            Self::KnowledgeSourceRead(e) => e.error_code(),
            Self::AlgorithmSourceRead(e) => e.error_code(),
            Self::Compile(e) => e.error_code(),
            Self::Execute(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::ResultHandler(e) => e.error_code(),
            Self::Close(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Finder { .. } => error_code::FINDER_ERROR,
            Self::Thread { .. } => error_code::PIPELINE_ERROR,
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}

/// Result of a query run that accumulates non-fatal errors.
/// Allows partial results to be returned even when some keys fail.
#[derive(Debug, Default)]
pub struct PartialResult<T: Default = ()> {
    /// The successful result data.
    pub data: T,
    /// Non-fatal errors collected during the run.
    pub errors: Vec<QueryError>,
}

impl<T: Default> PartialResult<T> {
    /// Create a new result with no errors.
    pub fn new(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// Add a non-fatal error.
    pub fn add_error(&mut self, error: QueryError) {
        self.errors.push(error);
    }

    /// Returns true if there are no non-fatal errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of non-fatal errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
