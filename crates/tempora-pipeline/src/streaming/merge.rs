use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use tempora_core::errors::{CloseError, DataSourceReadError};
use tempora_core::proposition::Proposition;
use tempora_core::traits::{DataStreamingEvent, DataStreamingEventIterator};

/// Every record of one key across all iterators, in iterator order.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBatch {
    pub key_id: String,
    pub propositions: Vec<Proposition>,
    /// Latest timestamp among the merged events.
    pub timestamp: DateTime<Utc>,
}

struct Cursor {
    iterator: Box<dyn DataStreamingEventIterator>,
    pending: Option<DataStreamingEvent>,
    last_key: Option<String>,
    exhausted: bool,
}

impl Cursor {
    /// Make sure `pending` holds the next event unless the iterator is exhausted.
    fn fill(&mut self, index: usize) -> Result<(), DataSourceReadError> {
        if self.pending.is_some() || self.exhausted {
            return Ok(());
        }
        match self.iterator.next_event()? {
            None => self.exhausted = true,
            Some(event) => {
                if let Some(previous) = &self.last_key {
                    if event.key_id.as_bytes() < previous.as_bytes() {
                        return Err(DataSourceReadError::OutOfOrder {
                            iterator: index,
                            key_id: event.key_id,
                            previous: previous.clone(),
                        });
                    }
                }
                self.last_key = Some(event.key_id.clone());
                self.pending = Some(event);
            }
        }
        Ok(())
    }

    fn pending_key(&self) -> Option<&str> {
        self.pending.as_ref().map(|e| e.key_id.as_str())
    }
}

/// Merges iterators that are each sorted by key id into one batch per key.
///
/// A key is emitted once every iterator has moved past it or run out.
pub struct StreamingMerge {
    cursors: Vec<Cursor>,
    closed: bool,
}

impl StreamingMerge {
    pub fn new(iterators: Vec<Box<dyn DataStreamingEventIterator>>) -> Self {
        Self {
            cursors: iterators
                .into_iter()
                .map(|iterator| Cursor {
                    iterator,
                    pending: None,
                    last_key: None,
                    exhausted: false,
                })
                .collect(),
            closed: false,
        }
    }

    pub fn iterator_count(&self) -> usize {
        self.cursors.len()
    }

    /// The next key's batch, or `None` when every iterator is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<KeyBatch>, DataSourceReadError> {
        if self.closed {
            return Ok(None);
        }
        for (index, cursor) in self.cursors.iter_mut().enumerate() {
            cursor.fill(index)?;
        }
        let Some(key_id) = self
            .cursors
            .iter()
            .filter_map(Cursor::pending_key)
            .min_by(|a, b| a.as_bytes().cmp(b.as_bytes()))
            .map(str::to_string)
        else {
            return Ok(None);
        };

        let mut propositions = Vec::new();
        let mut timestamp: Option<DateTime<Utc>> = None;
        for (index, cursor) in self.cursors.iter_mut().enumerate() {
            while cursor.pending_key() == Some(key_id.as_str()) {
                let Some(event) = cursor.pending.take() else {
                    break;
                };
                propositions.extend(event.data);
                timestamp = Some(timestamp.map_or(event.timestamp, |t| t.max(event.timestamp)));
                cursor.fill(index).map_err(|e| mid_key(e, index, &key_id))?;
            }
        }
        debug!(key_id = %key_id, records = propositions.len(), "key batch merged");
        Ok(Some(KeyBatch {
            key_id,
            propositions,
            timestamp: timestamp.unwrap_or_else(Utc::now),
        }))
    }

    /// Close every iterator, even after failures. Later calls do nothing.
    pub fn close_all(&mut self) -> Result<(), CloseError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let total = self.cursors.len();
        let mut failed = 0;
        let mut first: Option<(usize, String)> = None;
        for (index, cursor) in self.cursors.iter_mut().enumerate() {
            if let Err(e) = cursor.iterator.close() {
                warn!(iterator = index, error = %e, "closing data iterator failed");
                failed += 1;
                first.get_or_insert((index, e.to_string()));
            }
        }
        match first {
            None => Ok(()),
            Some((index, message)) => Err(CloseError::Failed {
                resource: format!("data iterator {index}"),
                message,
                failed,
                total,
            }),
        }
    }
}

fn mid_key(error: DataSourceReadError, iterator: usize, key_id: &str) -> DataSourceReadError {
    match error {
        e @ (DataSourceReadError::OutOfOrder { .. } | DataSourceReadError::MidKey { .. }) => e,
        other => DataSourceReadError::MidKey {
            iterator,
            key_id: key_id.to_string(),
            message: other.to_string(),
        },
    }
}

impl std::fmt::Debug for StreamingMerge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingMerge")
            .field("iterators", &self.cursors.len())
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempora_core::proposition::UniqueId;
    use tempora_core::sources::VecEventIterator;

    fn record(key: &str, n: u32) -> Proposition {
        Proposition::constant("demographics", UniqueId::new("t", format!("{key}-{n}")))
    }

    fn iterator(batches: &[(&str, u32)]) -> Box<dyn DataStreamingEventIterator> {
        Box::new(VecEventIterator::from_batches(
            batches
                .iter()
                .map(|(key, n)| (key.to_string(), vec![record(key, *n)])),
            Utc::now(),
        ))
    }

    #[test]
    fn keys_spanning_batches_and_iterators_merge_once() {
        let mut merge = StreamingMerge::new(vec![
            iterator(&[("a", 1), ("a", 2), ("c", 3)]),
            iterator(&[("a", 4), ("b", 5)]),
        ]);
        let mut seen = Vec::new();
        while let Some(batch) = merge.next_batch().unwrap() {
            let locals: Vec<String> = batch
                .propositions
                .iter()
                .map(|p| p.unique_id.local_id.clone())
                .collect();
            seen.push((batch.key_id, locals));
        }
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), vec!["a-1".to_string(), "a-2".into(), "a-4".into()]),
                ("b".to_string(), vec!["b-5".to_string()]),
                ("c".to_string(), vec!["c-3".to_string()]),
            ]
        );
        merge.close_all().unwrap();
        assert!(merge.next_batch().unwrap().is_none());
    }

    #[test]
    fn out_of_order_keys_fail() {
        let mut merge = StreamingMerge::new(vec![iterator(&[("b", 1), ("a", 2)])]);
        assert!(matches!(
            merge.next_batch(),
            Err(DataSourceReadError::OutOfOrder { iterator: 0, .. })
        ));
    }

    #[test]
    fn byte_wise_collation_orders_upper_case_first() {
        let mut merge = StreamingMerge::new(vec![iterator(&[("B", 1)]), iterator(&[("a", 2)])]);
        assert_eq!(merge.next_batch().unwrap().unwrap().key_id, "B");
        assert_eq!(merge.next_batch().unwrap().unwrap().key_id, "a");
    }
}
