//! Data sources: where raw propositions come from.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DataSourceReadError;
use crate::proposition::Proposition;

/// Restricts which propositions a data source returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Temporal propositions must lie within `[from, to]`. Constants always pass.
    Position {
        #[serde(default)]
        from: Option<i64>,
        #[serde(default)]
        to: Option<i64>,
    },
}

impl Filter {
    pub fn accepts(&self, proposition: &Proposition) -> bool {
        match self {
            Self::Position { from, to } => {
                let Some(interval) = proposition.interval() else {
                    return true;
                };
                from.map_or(true, |from| interval.min_start() >= from)
                    && to.map_or(true, |to| interval.max_finish() <= to)
            }
        }
    }
}

/// What to read: which keys (all when `None`), which proposition ids, which filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequest {
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    #[serde(default)]
    pub proposition_ids: BTreeSet<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl DataRequest {
    pub fn wants_key(&self, key_id: &str) -> bool {
        self.keys
            .as_ref()
            .map_or(true, |keys| keys.iter().any(|k| k == key_id))
    }

    /// An empty id set requests every proposition.
    pub fn accepts(&self, proposition: &Proposition) -> bool {
        (self.proposition_ids.is_empty() || self.proposition_ids.contains(&proposition.id))
            && self.filters.iter().all(|f| f.accepts(proposition))
    }
}

/// One batch of propositions for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct DataStreamingEvent {
    pub key_id: String,
    pub data: Vec<Proposition>,
    pub timestamp: DateTime<Utc>,
}

/// A stream of batches sorted by key id (byte-wise). A key may span several batches.
pub trait DataStreamingEventIterator: Send {
    fn next_event(&mut self) -> Result<Option<DataStreamingEvent>, DataSourceReadError>;

    fn close(&mut self) -> Result<(), DataSourceReadError>;
}

pub trait DataSource: Send + Sync {
    /// Name used in logs and errors.
    fn id(&self) -> &str;

    fn read_propositions(
        &self,
        request: &DataRequest,
    ) -> Result<BTreeMap<String, Vec<Proposition>>, DataSourceReadError>;

    fn stream(
        &self,
        request: &DataRequest,
    ) -> Result<Box<dyn DataStreamingEventIterator>, DataSourceReadError>;
}
