//! Low-level abstractions: an algorithm classifies windows of primitive parameter values.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::default_concatenable;
use crate::proposition::Value;
use crate::temporal::{Distance, GapFunction};

/// How many consecutive values the algorithm sees at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WindowSizing {
    /// Use the algorithm's own minimum and maximum window.
    #[default]
    AlgorithmDefault,
    /// One window covering the whole sequence.
    WholeSequence,
    Explicit { min: usize, max: usize },
}

/// One output value and the algorithm arguments that produce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowLevelValueDefinition {
    pub value: Value,
    #[serde(default)]
    pub arguments: BTreeMap<String, Value>,
}

impl LowLevelValueDefinition {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowLevelAbstractionDefinition {
    pub id: String,
    pub abstracted_from: BTreeSet<String>,
    pub algorithm_id: String,
    /// Tried in order; the first one the algorithm accepts wins.
    pub values: Vec<LowLevelValueDefinition>,
    #[serde(default)]
    pub window: WindowSizing,
    /// Consecutive values in a window must be no further apart than this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gap_between_values: Option<Distance>,
    #[serde(default)]
    pub gap_function: GapFunction,
    #[serde(default = "default_concatenable")]
    pub concatenable: bool,
}

impl LowLevelAbstractionDefinition {
    pub fn new<I, S>(id: impl Into<String>, abstracted_from: I, algorithm_id: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            abstracted_from: abstracted_from.into_iter().map(Into::into).collect(),
            algorithm_id: algorithm_id.into(),
            values: Vec::new(),
            window: WindowSizing::default(),
            max_gap_between_values: None,
            gap_function: GapFunction::default(),
            concatenable: true,
        }
    }

    pub fn with_value(mut self, value: LowLevelValueDefinition) -> Self {
        self.values.push(value);
        self
    }

    pub fn with_window(mut self, window: WindowSizing) -> Self {
        self.window = window;
        self
    }

    pub fn with_max_gap_between_values(mut self, gap: Distance) -> Self {
        self.max_gap_between_values = Some(gap);
        self
    }

    pub fn with_gap_function(mut self, gap_function: GapFunction) -> Self {
        self.gap_function = gap_function;
        self
    }

    pub fn with_concatenable(mut self, concatenable: bool) -> Self {
        self.concatenable = concatenable;
        self
    }
}
