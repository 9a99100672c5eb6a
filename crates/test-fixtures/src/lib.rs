//! Shared builders and JSON fixtures for Tempora integration tests.
//!
//! Positions in fixtures are hours since the epoch unless stated otherwise; use [`hours`]
//! to convert them to milliseconds.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::de::DeserializeOwned;

use tempora_core::definitions::{
    LowLevelAbstractionDefinition, LowLevelValueDefinition, PropositionDefinition, RawDefinition,
};
use tempora_core::errors::ResultHandlerError;
use tempora_core::sources::{InMemoryDataSource, InMemoryKnowledgeSource};
use tempora_core::traits::{DerivationMap, QueryResultsHandler, ReferenceIndex};
use tempora_core::{Interval, Proposition, UniqueId, Value};

/// Source id used for every fixture proposition.
pub const FIXTURE_SOURCE: &str = "fixture";

/// Root of the JSON fixtures shipped with this crate.
pub fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// A knowledge source built from a fixture file holding a list of definitions.
pub fn load_knowledge(relative_path: &str) -> InMemoryKnowledgeSource {
    let definitions: Vec<PropositionDefinition> = load_fixture(relative_path);
    definitions.into_iter().collect()
}

/// A data source built from a fixture file mapping key ids to propositions.
pub fn load_data_source(id: &str, relative_path: &str) -> InMemoryDataSource {
    let data: BTreeMap<String, Vec<Proposition>> = load_fixture(relative_path);
    let mut source = InMemoryDataSource::new(id);
    for (key_id, propositions) in data {
        for proposition in propositions {
            source.insert(&key_id, proposition);
        }
    }
    source
}

pub fn hours(n: i64) -> i64 {
    n * 3_600_000
}

pub fn uid(local: &str) -> UniqueId {
    UniqueId::new(FIXTURE_SOURCE, local)
}

/// A primitive parameter measured at `at` (milliseconds).
pub fn primitive(id: &str, local: &str, at: i64, value: impl Into<Value>) -> Proposition {
    Proposition::primitive(id, uid(local), at, value)
}

pub fn event(id: &str, local: &str, start: i64, finish: i64) -> Proposition {
    Proposition::event(id, uid(local), definite(start, finish))
}

pub fn abstract_parameter(
    id: &str,
    local: &str,
    start: i64,
    finish: i64,
    value: impl Into<Value>,
) -> Proposition {
    Proposition::abstract_parameter(id, uid(local), definite(start, finish), value.into())
}

pub fn context(id: &str, local: &str, start: i64, finish: i64) -> Proposition {
    Proposition::context(id, uid(local), definite(start, finish))
}

/// # Panics
/// Panics when `finish < start`.
pub fn definite(start: i64, finish: i64) -> Interval {
    Interval::definite(start, finish)
        .unwrap_or_else(|e| panic!("invalid fixture interval [{start}, {finish}]: {e}"))
}

/// A delete-stamped copy of `proposition`.
pub fn deleted(proposition: &Proposition) -> Proposition {
    proposition.delete_stamped(Utc::now())
}

/// `systolic` primitives with `systolic-high` (HIGH at or above 140) on top.
pub fn systolic_knowledge() -> InMemoryKnowledgeSource {
    InMemoryKnowledgeSource::new()
        .with_definition(PropositionDefinition::Primitive(RawDefinition::new("systolic")))
        .with_definition(PropositionDefinition::LowLevel(
            LowLevelAbstractionDefinition::new("systolic-high", ["systolic"], "valueThreshold")
                .with_value(
                    LowLevelValueDefinition::new(Value::nominal("HIGH"))
                        .with_argument("minThreshold", 140.0),
                ),
        ))
}

/// One delivered key, as seen by [`RecordingHandler`].
#[derive(Debug, Clone)]
pub struct RecordedResult {
    pub key_id: String,
    pub propositions: Vec<Arc<Proposition>>,
    pub forward: DerivationMap,
    pub backward: DerivationMap,
    pub references: ReferenceIndex,
    pub deletes: Vec<Arc<Proposition>>,
}

/// Everything a [`RecordingHandler`] observed. Shared so tests can inspect it after the
/// handler moved into the pipeline.
#[derive(Debug, Default)]
pub struct Recording {
    pub started: bool,
    pub finished: bool,
    pub results: Vec<RecordedResult>,
}

/// A results handler that records every call, optionally failing or panicking on the
/// n-th result (1-based).
#[derive(Debug, Default)]
pub struct RecordingHandler {
    recording: Arc<Mutex<Recording>>,
    pending_deletes: Vec<Arc<Proposition>>,
    fail_on: Option<usize>,
    panic_on: Option<usize>,
    seen: usize,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, nth: usize) -> Self {
        self.fail_on = Some(nth);
        self
    }

    pub fn panicking_on(mut self, nth: usize) -> Self {
        self.panic_on = Some(nth);
        self
    }

    pub fn recording(&self) -> Arc<Mutex<Recording>> {
        Arc::clone(&self.recording)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recording> {
        self.recording
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl QueryResultsHandler for RecordingHandler {
    fn start(&mut self) -> Result<(), ResultHandlerError> {
        self.lock().started = true;
        Ok(())
    }

    fn handle_query_result(
        &mut self,
        key_id: &str,
        propositions: &[Arc<Proposition>],
        forward: &DerivationMap,
        backward: &DerivationMap,
        references: &ReferenceIndex,
    ) -> Result<(), ResultHandlerError> {
        self.seen += 1;
        if self.panic_on == Some(self.seen) {
            panic!("recording handler told to panic on result {}", self.seen);
        }
        if self.fail_on == Some(self.seen) {
            return Err(ResultHandlerError::Processing {
                key_id: key_id.to_string(),
                message: format!("told to fail on result {}", self.seen),
            });
        }
        let deletes = std::mem::take(&mut self.pending_deletes);
        self.lock().results.push(RecordedResult {
            key_id: key_id.to_string(),
            propositions: propositions.to_vec(),
            forward: forward.clone(),
            backward: backward.clone(),
            references: references.clone(),
            deletes,
        });
        Ok(())
    }

    fn handle_deletes(
        &mut self,
        _key_id: &str,
        deleted: &[Arc<Proposition>],
    ) -> Result<(), ResultHandlerError> {
        self.pending_deletes = deleted.to_vec();
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ResultHandlerError> {
        self.lock().finished = true;
        Ok(())
    }
}
