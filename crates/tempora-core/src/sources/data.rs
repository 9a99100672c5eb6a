use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::errors::DataSourceReadError;
use crate::proposition::Proposition;
use crate::traits::{DataRequest, DataSource, DataStreamingEvent, DataStreamingEventIterator};

/// Propositions held per key. Keys iterate in byte-wise order.
#[derive(Debug, Clone)]
pub struct InMemoryDataSource {
    id: String,
    data: BTreeMap<String, Vec<Proposition>>,
    batch_size: usize,
}

impl InMemoryDataSource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: BTreeMap::new(),
            batch_size: usize::MAX,
        }
    }

    pub fn with_proposition(mut self, key_id: impl Into<String>, proposition: Proposition) -> Self {
        self.insert(key_id, proposition);
        self
    }

    pub fn insert(&mut self, key_id: impl Into<String>, proposition: Proposition) {
        self.data.entry(key_id.into()).or_default().push(proposition);
    }

    /// Split each key's records into streaming batches of at most `batch_size`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn select(&self, request: &DataRequest) -> BTreeMap<String, Vec<Proposition>> {
        self.data
            .iter()
            .filter(|(key, _)| request.wants_key(key))
            .filter_map(|(key, propositions)| {
                let selected: Vec<Proposition> = propositions
                    .iter()
                    .filter(|p| request.accepts(p))
                    .cloned()
                    .collect();
                (!selected.is_empty()).then(|| (key.clone(), selected))
            })
            .collect()
    }
}

impl DataSource for InMemoryDataSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn read_propositions(
        &self,
        request: &DataRequest,
    ) -> Result<BTreeMap<String, Vec<Proposition>>, DataSourceReadError> {
        Ok(self.select(request))
    }

    fn stream(
        &self,
        request: &DataRequest,
    ) -> Result<Box<dyn DataStreamingEventIterator>, DataSourceReadError> {
        let timestamp = Utc::now();
        let mut events = Vec::new();
        for (key_id, propositions) in self.select(request) {
            for chunk in propositions.chunks(self.batch_size) {
                events.push(DataStreamingEvent {
                    key_id: key_id.clone(),
                    data: chunk.to_vec(),
                    timestamp,
                });
            }
        }
        Ok(Box::new(VecEventIterator::new(events)))
    }
}

/// Replays a fixed list of events. Events are yielded exactly as given, so tests can
/// build out-of-order or failing streams.
#[derive(Debug, Default)]
pub struct VecEventIterator {
    events: VecDeque<Result<DataStreamingEvent, DataSourceReadError>>,
    closed: bool,
}

impl VecEventIterator {
    pub fn new(events: Vec<DataStreamingEvent>) -> Self {
        Self {
            events: events.into_iter().map(Ok).collect(),
            closed: false,
        }
    }

    /// Yields `events`, then fails with `error`.
    pub fn failing_after(events: Vec<DataStreamingEvent>, error: DataSourceReadError) -> Self {
        let mut iterator = Self::new(events);
        iterator.events.push_back(Err(error));
        iterator
    }

    /// Convenience for tests: one event per `(key, propositions)`.
    pub fn from_batches<I>(batches: I, timestamp: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = (String, Vec<Proposition>)>,
    {
        Self::new(
            batches
                .into_iter()
                .map(|(key_id, data)| DataStreamingEvent {
                    key_id,
                    data,
                    timestamp,
                })
                .collect(),
        )
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl DataStreamingEventIterator for VecEventIterator {
    fn next_event(&mut self) -> Result<Option<DataStreamingEvent>, DataSourceReadError> {
        if self.closed {
            return Ok(None);
        }
        self.events.pop_front().transpose()
    }

    fn close(&mut self) -> Result<(), DataSourceReadError> {
        self.closed = true;
        self.events.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposition::UniqueId;
    use crate::traits::Filter;

    fn source() -> InMemoryDataSource {
        InMemoryDataSource::new("mem")
            .with_proposition("k2", Proposition::primitive("hr", UniqueId::new("mem", "1"), 10, 80.0))
            .with_proposition("k1", Proposition::primitive("hr", UniqueId::new("mem", "2"), 20, 70.0))
            .with_proposition("k1", Proposition::primitive("bp", UniqueId::new("mem", "3"), 30, 120.0))
            .with_proposition("k1", Proposition::primitive("hr", UniqueId::new("mem", "4"), 500, 90.0))
    }

    #[test]
    fn stream_is_sorted_by_key_and_batched() {
        let mut it = source().with_batch_size(1).stream(&DataRequest::default()).unwrap();
        let mut keys = Vec::new();
        while let Some(event) = it.next_event().unwrap() {
            assert_eq!(event.data.len(), 1);
            keys.push(event.key_id);
        }
        assert_eq!(keys, vec!["k1", "k1", "k1", "k2"]);
    }

    #[test]
    fn request_filters_ids_and_positions() {
        let request = DataRequest {
            keys: Some(vec!["k1".to_string()]),
            proposition_ids: ["hr".to_string()].into_iter().collect(),
            filters: vec![Filter::Position {
                from: Some(0),
                to: Some(100),
            }],
        };
        let data = source().read_propositions(&request).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data["k1"].len(), 1);
        assert_eq!(data["k1"][0].unique_id.local_id, "2");
    }
}
