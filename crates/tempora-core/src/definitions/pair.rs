use serde::{Deserialize, Serialize};

use super::default_concatenable;
use super::extended::TemporalExtendedPropositionDefinition;
use super::high_level::HighLevelAbstractionDefinition;
use crate::proposition::Value;
use crate::temporal::{GapFunction, Relation};

/// Two descriptors and one relation between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairDefinition {
    pub id: String,
    pub lhs: TemporalExtendedPropositionDefinition,
    pub rhs: TemporalExtendedPropositionDefinition,
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub gap_function: GapFunction,
    #[serde(default = "default_concatenable")]
    pub concatenable: bool,
}

impl PairDefinition {
    pub fn new(
        id: impl Into<String>,
        lhs: TemporalExtendedPropositionDefinition,
        rhs: TemporalExtendedPropositionDefinition,
        relation: impl Into<Relation>,
    ) -> Self {
        Self {
            id: id.into(),
            lhs,
            rhs,
            relation: relation.into(),
            value: None,
            gap_function: GapFunction::default(),
            concatenable: true,
        }
    }

    /// The equivalent two-descriptor pattern.
    pub fn to_pattern(&self) -> HighLevelAbstractionDefinition {
        HighLevelAbstractionDefinition {
            id: self.id.clone(),
            extended: vec![self.lhs.clone(), self.rhs.clone()],
            relations: Vec::new(),
            value: self.value.clone(),
            offset: None,
            gap_function: self.gap_function.clone(),
            concatenable: self.concatenable,
        }
        .with_relation(0, 1, self.relation.clone())
    }
}
