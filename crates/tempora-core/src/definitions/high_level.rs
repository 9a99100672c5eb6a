//! High-level abstractions: temporal patterns over several descriptors.

use serde::{Deserialize, Serialize};

use super::default_concatenable;
use super::extended::TemporalExtendedPropositionDefinition;
use crate::constants::DEFAULT_PATTERN_VALUE;
use crate::proposition::Value;
use crate::temporal::{Distance, GapFunction, Relation, Side};

/// A relation that must hold between the instances assigned to two descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSpec {
    /// Index into the definition's descriptors.
    pub lhs: usize,
    pub rhs: usize,
    pub relation: Relation,
}

/// Places the output interval relative to matched components.
///
/// Start is the chosen side of the `start_index` component plus `start_offset`; finish
/// likewise. Without an offset the output spans every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternOffset {
    pub start_index: usize,
    pub start_side: Side,
    pub start_offset: Distance,
    pub finish_index: usize,
    pub finish_side: Side,
    pub finish_offset: Distance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighLevelAbstractionDefinition {
    pub id: String,
    pub extended: Vec<TemporalExtendedPropositionDefinition>,
    #[serde(default)]
    pub relations: Vec<RelationSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<PatternOffset>,
    #[serde(default)]
    pub gap_function: GapFunction,
    #[serde(default = "default_concatenable")]
    pub concatenable: bool,
}

impl HighLevelAbstractionDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extended: Vec::new(),
            relations: Vec::new(),
            value: None,
            offset: None,
            gap_function: GapFunction::default(),
            concatenable: true,
        }
    }

    /// Add a descriptor; returns the builder. Descriptor indices follow insertion order.
    pub fn with_extended(mut self, tepd: TemporalExtendedPropositionDefinition) -> Self {
        self.extended.push(tepd);
        self
    }

    pub fn with_relation(mut self, lhs: usize, rhs: usize, relation: impl Into<Relation>) -> Self {
        self.relations.push(RelationSpec {
            lhs,
            rhs,
            relation: relation.into(),
        });
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_offset(mut self, offset: PatternOffset) -> Self {
        self.offset = Some(offset);
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

    pub fn output_value(&self) -> Value {
        self.value
            .clone()
            .unwrap_or(Value::Boolean(DEFAULT_PATTERN_VALUE))
    }
}
