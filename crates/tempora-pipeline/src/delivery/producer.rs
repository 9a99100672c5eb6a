use std::collections::BTreeSet;

use crossbeam_channel::{SendTimeoutError, Sender};

use tempora_core::errors::{PartialResult, QueryError};
use tempora_core::traits::Cancellable;
use tempora_engine::engine::KeyResult;
use tempora_engine::ExecutionStrategy;

use super::{Delivery, PipelineContext};
use crate::streaming::StreamingMerge;
use crate::tracing_setup::events;
use crate::PRODUCER_THREAD;

#[derive(Debug, Default)]
pub(super) struct ProducerReport {
    pub processed: usize,
    /// Set when the producer had to stop early because of a failure.
    pub fatal: Option<QueryError>,
}

/// Execute every merged key and enqueue its result. Per-key execution failures are
/// collected and skipped; a read failure ends the run.
pub(super) fn produce(
    ctx: &PipelineContext,
    merge: &mut StreamingMerge,
    strategy: &mut dyn ExecutionStrategy,
    tx: Sender<Delivery>,
) -> PartialResult<ProducerReport> {
    let mut report = PartialResult::new(ProducerReport::default());
    let mut seen = BTreeSet::new();

    loop {
        if ctx.token.is_cancelled() {
            events::pipeline_cancelled(&ctx.query_id, PRODUCER_THREAD);
            return report;
        }
        let batch = match merge.next_batch() {
            Ok(Some(batch)) => batch,
            Ok(None) => break,
            Err(e) => {
                report.data.fatal = Some(e.into());
                return report;
            }
        };
        seen.insert(batch.key_id.clone());
        let outcome = strategy.execute(&batch.key_id, batch.propositions);
        if !forward(ctx, &tx, &batch.key_id, outcome.map(Some), &mut report) {
            return report;
        }
    }

    if ctx.reprocess {
        let keys = match strategy.persisted_keys() {
            Ok(keys) => keys,
            Err(e) => {
                report.data.fatal = Some(e.into());
                return report;
            }
        };
        for key_id in keys
            .into_iter()
            .filter(|k| !seen.contains(k) && ctx.wants_key(k))
        {
            if ctx.token.is_cancelled() {
                events::pipeline_cancelled(&ctx.query_id, PRODUCER_THREAD);
                return report;
            }
            let outcome = strategy.reprocess(&key_id);
            if !forward(ctx, &tx, &key_id, outcome, &mut report) {
                return report;
            }
        }
    }

    send(ctx, &tx, Delivery::Done);
    report
}

/// Record one key's outcome and enqueue it. `false` means the consumer is gone.
fn forward(
    ctx: &PipelineContext,
    tx: &Sender<Delivery>,
    key_id: &str,
    outcome: Result<Option<KeyResult>, tempora_core::errors::ExecutionError>,
    report: &mut PartialResult<ProducerReport>,
) -> bool {
    match outcome {
        Ok(Some(result)) => {
            report.data.processed += 1;
            events::key_processed(key_id, result.propositions.len(), result.to_delete.len());
            send(ctx, tx, Delivery::Result(result.into()))
        }
        Ok(None) => true,
        Err(e) => {
            events::key_failed(key_id, &e);
            report.add_error(e.into());
            true
        }
    }
}

/// Blocking send that wakes every poll interval to honour cancellation.
fn send(ctx: &PipelineContext, tx: &Sender<Delivery>, mut delivery: Delivery) -> bool {
    loop {
        match tx.send_timeout(delivery, ctx.poll_interval) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(returned)) => {
                if ctx.token.is_cancelled() {
                    events::pipeline_cancelled(&ctx.query_id, PRODUCER_THREAD);
                    return false;
                }
                delivery = returned;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}
