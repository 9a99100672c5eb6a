//! Structured log events for query execution.
//!
//! Each function emits a `tracing` event with structured fields.

use crate::query::ExecutionMode;

pub fn query_started(query_id: &str, mode: ExecutionMode, data_sources: usize) {
    tracing::info!(
        event = "query_started",
        query_id = %query_id,
        mode = ?mode,
        data_sources = data_sources,
        "query started"
    );
}

pub fn query_finished(query_id: &str, keys_processed: usize, keys_delivered: usize, errors: usize) {
    tracing::info!(
        event = "query_finished",
        query_id = %query_id,
        keys_processed = keys_processed,
        keys_delivered = keys_delivered,
        errors = errors,
        "query finished"
    );
}

pub fn key_processed(key_id: &str, propositions: usize, deletes: usize) {
    tracing::debug!(
        event = "key_processed",
        key_id = %key_id,
        propositions = propositions,
        deletes = deletes,
        "key processed"
    );
}

/// A per-key failure. The key is skipped and the run continues.
pub fn key_failed(key_id: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(
        event = "key_failed",
        key_id = %key_id,
        error = %error,
        "key failed"
    );
}

pub fn pipeline_cancelled(query_id: &str, thread: &str) {
    tracing::info!(
        event = "pipeline_cancelled",
        query_id = %query_id,
        thread = %thread,
        "pipeline cancelled"
    );
}

pub fn delivery_failed(query_id: &str, key_id: &str, error: &dyn std::fmt::Display) {
    tracing::error!(
        event = "delivery_failed",
        query_id = %query_id,
        key_id = %key_id,
        error = %error,
        "result delivery failed"
    );
}

pub fn stores_opened(query_id: &str, in_memory: bool) {
    tracing::info!(
        event = "stores_opened",
        query_id = %query_id,
        in_memory = in_memory,
        "stateful stores opened"
    );
}

pub fn stores_closed(query_id: &str, stores: usize) {
    tracing::info!(
        event = "stores_closed",
        query_id = %query_id,
        stores = stores,
        "stateful stores closed"
    );
}
