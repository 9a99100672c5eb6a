use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use tempora_core::errors::{QueryError, ResultHandlerError};
use tempora_core::traits::{Cancellable, QueryResultsHandler};

use super::{panic_message, Delivery, PipelineContext, QueryResultBundle};
use crate::tracing_setup::events;
use crate::CONSUMER_THREAD;

#[derive(Debug, Default)]
pub(super) struct ConsumerReport {
    pub delivered: usize,
    pub error: Option<QueryError>,
}

/// Hand each bundle to `handler` in arrival order until `Done`, disconnection,
/// cancellation or the first handler failure.
pub(super) fn consume(
    ctx: &PipelineContext,
    handler: &mut dyn QueryResultsHandler,
    rx: Receiver<Delivery>,
) -> ConsumerReport {
    let mut report = ConsumerReport::default();
    loop {
        if ctx.token.is_cancelled() {
            events::pipeline_cancelled(&ctx.query_id, CONSUMER_THREAD);
            break;
        }
        let bundle = match rx.recv_timeout(ctx.poll_interval) {
            Ok(Delivery::Result(bundle)) => bundle,
            Ok(Delivery::Done) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => continue,
        };
        match deliver(handler, &bundle) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                events::delivery_failed(&ctx.query_id, &bundle.key_id, &e);
                ctx.token.cancel();
                report.error = Some(e.into());
                break;
            }
        }
    }
    // Dropping the receiver unblocks a producer waiting on a full queue.
    drop(rx);
    report
}

fn deliver(
    handler: &mut dyn QueryResultsHandler,
    bundle: &QueryResultBundle,
) -> Result<(), ResultHandlerError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        if !bundle.deletes.is_empty() {
            handler.handle_deletes(&bundle.key_id, &bundle.deletes)?;
        }
        handler.handle_query_result(
            &bundle.key_id,
            &bundle.propositions,
            &bundle.forward,
            &bundle.backward,
            &bundle.references,
        )
    }));
    match outcome {
        Ok(result) => result,
        Err(payload) => Err(ResultHandlerError::Panicked {
            message: panic_message(&*payload),
        }),
    }
}
