//! # tempora-pipeline
//!
//! Runs a query end to end: compiles the requested abstractions, merges the data
//! sources' key-sorted streams, executes each key on a producer thread and hands the
//! results to a `QueryResultsHandler` on a consumer thread.

pub mod delivery;
pub mod executor;
pub mod query;
pub mod streaming;
pub mod tracing_setup;

pub use delivery::{Delivery, PipelineContext, PipelineOutcome, QueryResultBundle};
pub use executor::{ExecutionSummary, QueryExecutor};
pub use query::{ExecutionMode, Query};
pub use streaming::{KeyBatch, StreamingMerge};

/// Thread name of the key-processing side of the pipeline.
pub const PRODUCER_THREAD: &str = "tempora-producer";
/// Thread name of the result-delivery side of the pipeline.
pub const CONSUMER_THREAD: &str = "tempora-consumer";
