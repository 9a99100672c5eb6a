use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;

use tempora_core::errors::{CloseError, DataSourceReadError};
use tempora_core::proposition::{Proposition, UniqueId};
use tempora_core::sources::VecEventIterator;
use tempora_core::traits::{DataStreamingEvent, DataStreamingEventIterator};
use tempora_pipeline::StreamingMerge;

/// Wraps a `VecEventIterator` and reports close through a shared flag.
struct TrackedIterator {
    inner: VecEventIterator,
    closed: Arc<AtomicBool>,
    fail_close: bool,
}

impl DataStreamingEventIterator for TrackedIterator {
    fn next_event(&mut self) -> Result<Option<DataStreamingEvent>, DataSourceReadError> {
        self.inner.next_event()
    }

    fn close(&mut self) -> Result<(), DataSourceReadError> {
        self.closed.store(true, Ordering::SeqCst);
        self.inner.close()?;
        if self.fail_close {
            return Err(DataSourceReadError::Backend {
                source_name: "tracked".to_string(),
                message: "close refused".to_string(),
            });
        }
        Ok(())
    }
}

fn tracked(
    batches: Vec<(String, Vec<Proposition>)>,
    fail_close: bool,
) -> (Box<dyn DataStreamingEventIterator>, Arc<AtomicBool>) {
    let closed = Arc::new(AtomicBool::new(false));
    let iterator = TrackedIterator {
        inner: VecEventIterator::from_batches(batches, Utc::now()),
        closed: Arc::clone(&closed),
        fail_close,
    };
    (Box::new(iterator), closed)
}

fn record(key: &str, iterator: usize, n: usize) -> Proposition {
    Proposition::constant("demographics", UniqueId::new("t", format!("{key}-{iterator}-{n}")))
}

#[test]
fn close_all_closes_every_iterator_and_reports_the_first_failure() {
    let (a, a_closed) = tracked(vec![("k1".to_string(), vec![record("k1", 0, 0)])], false);
    let (b, b_closed) = tracked(Vec::new(), true);
    let (c, c_closed) = tracked(Vec::new(), true);
    let mut merge = StreamingMerge::new(vec![a, b, c]);

    let err = merge.close_all().unwrap_err();
    assert!(a_closed.load(Ordering::SeqCst));
    assert!(b_closed.load(Ordering::SeqCst));
    assert!(c_closed.load(Ordering::SeqCst));
    match err {
        CloseError::Failed {
            resource,
            failed,
            total,
            ..
        } => {
            assert_eq!(resource, "data iterator 1");
            assert_eq!((failed, total), (2, 3));
        }
    }
    // Idempotent.
    assert!(merge.close_all().is_ok());
}

#[test]
fn failure_while_draining_a_key_names_the_key() {
    let failing = VecEventIterator::failing_after(
        vec![DataStreamingEvent {
            key_id: "k1".to_string(),
            data: vec![record("k1", 0, 0)],
            timestamp: Utc::now(),
        }],
        DataSourceReadError::Backend {
            source_name: "db".to_string(),
            message: "connection reset".to_string(),
        },
    );
    let mut merge = StreamingMerge::new(vec![Box::new(failing)]);
    match merge.next_batch() {
        Err(DataSourceReadError::MidKey {
            iterator,
            key_id,
            message,
        }) => {
            assert_eq!(iterator, 0);
            assert_eq!(key_id, "k1");
            assert!(message.contains("connection reset"));
        }
        other => panic!("expected a mid-key failure, got {other:?}"),
    }
}

proptest! {
    /// Every key comes out once, in byte-wise order, carrying all of its records.
    #[test]
    fn merge_is_the_ordered_union_of_its_inputs(
        inputs in prop::collection::vec(
            prop::collection::btree_map("[a-eA-C]{1,2}", 1usize..4, 0..6),
            1..4,
        )
    ) {
        let mut expected: BTreeMap<String, usize> = BTreeMap::new();
        let mut iterators: Vec<Box<dyn DataStreamingEventIterator>> = Vec::new();
        for (index, keys) in inputs.iter().enumerate() {
            let mut batches = Vec::new();
            for (key, count) in keys {
                *expected.entry(key.clone()).or_default() += count;
                for n in 0..*count {
                    batches.push((key.clone(), vec![record(key, index, n)]));
                }
            }
            iterators.push(Box::new(VecEventIterator::from_batches(batches, Utc::now())));
        }

        let mut merge = StreamingMerge::new(iterators);
        let mut actual: Vec<(String, usize)> = Vec::new();
        while let Some(batch) = merge.next_batch().unwrap() {
            let prefix = format!("{}-", batch.key_id);
            prop_assert!(batch.propositions.iter().all(|p| p.unique_id.local_id.starts_with(&prefix)));
            actual.push((batch.key_id, batch.propositions.len()));
        }
        prop_assert_eq!(actual, expected.into_iter().collect::<Vec<_>>());
        prop_assert!(merge.close_all().is_ok());
    }
}
