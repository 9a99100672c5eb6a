//! Producer/consumer delivery of per-key results over a bounded queue.
//!
//! The producer owns the merge, the execution strategy and (through it) the stores. The
//! consumer only sees finished [`QueryResultBundle`]s. A handler failure on the consumer
//! side aborts the run and drops the receiver, which wakes a producer blocked on a full
//! queue.

mod consumer;
mod producer;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tempora_core::config::PipelineConfig;
use tempora_core::errors::QueryError;
use tempora_core::proposition::Proposition;
use tempora_core::traits::{
    Cancellable, CancellationToken, DerivationMap, QueryResultsHandler, ReferenceIndex,
};
use tempora_engine::engine::KeyResult;
use tempora_engine::ExecutionStrategy;

use crate::streaming::StreamingMerge;
use crate::{CONSUMER_THREAD, PRODUCER_THREAD};

/// One key's finished output, immutable once enqueued.
#[derive(Debug, Clone, Default)]
pub struct QueryResultBundle {
    pub key_id: String,
    pub propositions: Vec<Arc<Proposition>>,
    pub forward: DerivationMap,
    pub backward: DerivationMap,
    pub references: ReferenceIndex,
    pub deletes: Vec<Arc<Proposition>>,
}

impl From<KeyResult> for QueryResultBundle {
    fn from(result: KeyResult) -> Self {
        Self {
            key_id: result.key_id,
            propositions: result.propositions,
            forward: result.forward,
            backward: result.backward,
            references: result.references,
            deletes: result.to_delete,
        }
    }
}

/// What travels over the queue. `Done` is the end-of-stream marker.
#[derive(Debug)]
pub enum Delivery {
    Result(QueryResultBundle),
    Done,
}

/// Shared, read-only settings of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub query_id: String,
    /// A child of the caller's token. Either thread cancels it to stop the other.
    pub token: CancellationToken,
    pub queue_capacity: usize,
    pub poll_interval: Duration,
    /// Persisted keys to rerun after the stream is exhausted, unless they were seen.
    pub reprocess: bool,
    /// Restricts reprocessing to these keys when set.
    pub keys: Option<Vec<String>>,
}

impl PipelineContext {
    pub fn new(
        query_id: impl Into<String>,
        caller: &CancellationToken,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            query_id: query_id.into(),
            token: caller.child(),
            queue_capacity: config.queue_capacity,
            poll_interval: config.poll_interval(),
            reprocess: false,
            keys: None,
        }
    }

    pub fn with_reprocess(mut self, keys: Option<Vec<String>>) -> Self {
        self.reprocess = true;
        self.keys = keys;
        self
    }

    fn wants_key(&self, key_id: &str) -> bool {
        self.keys
            .as_ref()
            .map_or(true, |keys| keys.iter().any(|k| k == key_id))
    }
}

/// What both threads did. `fatal` errors fail the query; `non_fatal` ones only skipped keys.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub keys_processed: usize,
    pub keys_delivered: usize,
    pub non_fatal: Vec<QueryError>,
    pub fatal: Vec<QueryError>,
}

/// Run the producer and consumer threads to completion and join both.
pub fn run_pipeline(
    ctx: &PipelineContext,
    merge: &mut StreamingMerge,
    strategy: &mut dyn ExecutionStrategy,
    handler: &mut dyn QueryResultsHandler,
) -> PipelineOutcome {
    let (tx, rx) = crossbeam_channel::bounded::<Delivery>(ctx.queue_capacity.max(1));
    let mut outcome = PipelineOutcome::default();

    thread::scope(|scope| {
        let producer = thread::Builder::new()
            .name(PRODUCER_THREAD.to_string())
            .spawn_scoped(scope, move || producer::produce(ctx, merge, strategy, tx));
        let consumer = thread::Builder::new()
            .name(CONSUMER_THREAD.to_string())
            .spawn_scoped(scope, move || consumer::consume(ctx, handler, rx));

        match consumer {
            Ok(handle) => match handle.join() {
                Ok(report) => {
                    outcome.keys_delivered = report.delivered;
                    outcome.fatal.extend(report.error);
                }
                Err(payload) => {
                    ctx.token.cancel();
                    outcome.fatal.push(thread_error(CONSUMER_THREAD, payload));
                }
            },
            Err(e) => {
                ctx.token.cancel();
                outcome.fatal.push(QueryError::Thread {
                    name: CONSUMER_THREAD.to_string(),
                    message: e.to_string(),
                });
            }
        }

        match producer {
            Ok(handle) => match handle.join() {
                Ok(report) => {
                    outcome.keys_processed = report.data.processed;
                    outcome.non_fatal.extend(report.errors);
                    // A producer failure is reported before a consumer failure.
                    if let Some(fatal) = report.data.fatal {
                        outcome.fatal.insert(0, fatal);
                    }
                }
                Err(payload) => outcome
                    .fatal
                    .insert(0, thread_error(PRODUCER_THREAD, payload)),
            },
            Err(e) => outcome.fatal.insert(
                0,
                QueryError::Thread {
                    name: PRODUCER_THREAD.to_string(),
                    message: e.to_string(),
                },
            ),
        }
    });
    outcome
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn thread_error(name: &str, payload: Box<dyn std::any::Any + Send>) -> QueryError {
    QueryError::Thread {
        name: name.to_string(),
        message: panic_message(&*payload),
    }
}
