//! What a caller asks for.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use tempora_core::traits::{DataRequest, Filter};

/// Whether working state survives between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Fresh working memory for every key.
    #[default]
    Stateless,
    /// Working memory and derivations persist per key in the configured stores.
    ///
    /// State outlives the query only with on-disk storage (`storage.in_memory = false` and a
    /// `storage.directory`). With the default in-memory storage, each query starts empty.
    Stateful,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: String,
    /// Keys to process; `None` means every key the data sources have.
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    /// Abstractions (or raw ids) to compute and return.
    pub proposition_ids: BTreeSet<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub mode: ExecutionMode,
    /// In stateful mode, also rerun persisted keys the data sources did not return.
    #[serde(default)]
    pub reprocess: bool,
}

impl Query {
    pub fn new<I, S>(id: impl Into<String>, proposition_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            keys: None,
            proposition_ids: proposition_ids.into_iter().map(Into::into).collect(),
            filters: Vec::new(),
            mode: ExecutionMode::Stateless,
            reprocess: false,
        }
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn stateful(mut self) -> Self {
        self.mode = ExecutionMode::Stateful;
        self
    }

    pub fn with_reprocess(mut self, reprocess: bool) -> Self {
        self.reprocess = reprocess;
        self
    }

    /// The data request for `raw_ids`, the raw proposition ids the compiled rules consume.
    pub fn data_request(&self, raw_ids: &BTreeSet<String>) -> DataRequest {
        DataRequest {
            keys: self.keys.clone(),
            proposition_ids: raw_ids.clone(),
            filters: self.filters.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_deserializes_with_defaults() {
        let query: Query =
            serde_json::from_str(r#"{"id":"q1","proposition_ids":["systolic-high"]}"#).unwrap();
        assert_eq!(query, Query::new("q1", ["systolic-high"]));
        assert_eq!(query.mode, ExecutionMode::Stateless);
    }
}
