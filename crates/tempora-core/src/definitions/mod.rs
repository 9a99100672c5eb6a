//! Proposition and abstraction definitions, the knowledge the compiler turns into rules.

pub mod context;
pub mod extended;
pub mod high_level;
pub mod low_level;
pub mod pair;
pub mod raw;
pub mod slice;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use context::{ContextDefinition, ContextKind, ContextOffset};
pub use extended::TemporalExtendedPropositionDefinition;
pub use high_level::{HighLevelAbstractionDefinition, PatternOffset, RelationSpec};
pub use low_level::{LowLevelAbstractionDefinition, LowLevelValueDefinition, WindowSizing};
pub use pair::PairDefinition;
pub use raw::RawDefinition;
pub use slice::SliceDefinition;

use crate::temporal::GapFunction;

pub(crate) fn default_concatenable() -> bool {
    true
}

/// Behavior shared by every definition that derives new propositions.
pub trait AbstractionDefinition {
    fn id(&self) -> &str;

    /// Ids of the propositions this abstraction is computed from.
    fn abstracted_from(&self) -> BTreeSet<String>;

    fn gap_function(&self) -> &GapFunction;

    /// Whether adjacent instances with equal values are merged.
    fn concatenable(&self) -> bool;
}

impl AbstractionDefinition for LowLevelAbstractionDefinition {
    fn id(&self) -> &str {
        &self.id
    }

    fn abstracted_from(&self) -> BTreeSet<String> {
        self.abstracted_from.clone()
    }

    fn gap_function(&self) -> &GapFunction {
        &self.gap_function
    }

    fn concatenable(&self) -> bool {
        self.concatenable
    }
}

impl AbstractionDefinition for HighLevelAbstractionDefinition {
    fn id(&self) -> &str {
        &self.id
    }

    fn abstracted_from(&self) -> BTreeSet<String> {
        self.extended
            .iter()
            .map(|e| e.proposition_id.clone())
            .collect()
    }

    fn gap_function(&self) -> &GapFunction {
        &self.gap_function
    }

    fn concatenable(&self) -> bool {
        self.concatenable
    }
}

impl AbstractionDefinition for PairDefinition {
    fn id(&self) -> &str {
        &self.id
    }

    fn abstracted_from(&self) -> BTreeSet<String> {
        [self.lhs.proposition_id.clone(), self.rhs.proposition_id.clone()]
            .into_iter()
            .collect()
    }

    fn gap_function(&self) -> &GapFunction {
        &self.gap_function
    }

    fn concatenable(&self) -> bool {
        self.concatenable
    }
}

static SLICE_GAP_FUNCTION: GapFunction = GapFunction::Simple { max_gap: None };

impl AbstractionDefinition for SliceDefinition {
    fn id(&self) -> &str {
        &self.id
    }

    fn abstracted_from(&self) -> BTreeSet<String> {
        BTreeSet::from([self.component.proposition_id.clone()])
    }

    fn gap_function(&self) -> &GapFunction {
        &SLICE_GAP_FUNCTION
    }

    fn concatenable(&self) -> bool {
        false
    }
}

impl AbstractionDefinition for ContextDefinition {
    fn id(&self) -> &str {
        &self.id
    }

    fn abstracted_from(&self) -> BTreeSet<String> {
        match &self.kind {
            ContextKind::Induced { inducer, .. } => {
                BTreeSet::from([inducer.proposition_id.clone()])
            }
            ContextKind::Composite { sub_contexts } => sub_contexts.iter().cloned().collect(),
        }
    }

    fn gap_function(&self) -> &GapFunction {
        &self.gap_function
    }

    fn concatenable(&self) -> bool {
        self.concatenable && !self.is_composite()
    }
}

/// Every kind of proposition definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "definition", rename_all = "snake_case")]
pub enum PropositionDefinition {
    Primitive(RawDefinition),
    Event(RawDefinition),
    Constant(RawDefinition),
    LowLevel(LowLevelAbstractionDefinition),
    HighLevel(HighLevelAbstractionDefinition),
    Pair(PairDefinition),
    Slice(SliceDefinition),
    Context(ContextDefinition),
}

impl PropositionDefinition {
    pub fn id(&self) -> &str {
        match self {
            Self::Primitive(d) | Self::Event(d) | Self::Constant(d) => &d.id,
            Self::LowLevel(d) => &d.id,
            Self::HighLevel(d) => &d.id,
            Self::Pair(d) => &d.id,
            Self::Slice(d) => &d.id,
            Self::Context(d) => &d.id,
        }
    }

    /// Direct inverse-is-a children. Only raw definitions have any.
    pub fn inverse_is_a(&self) -> &[String] {
        match self {
            Self::Primitive(d) | Self::Event(d) | Self::Constant(d) => &d.inverse_is_a,
            _ => &[],
        }
    }

    pub fn as_abstraction(&self) -> Option<&dyn AbstractionDefinition> {
        match self {
            Self::Primitive(_) | Self::Event(_) | Self::Constant(_) => None,
            Self::LowLevel(d) => Some(d),
            Self::HighLevel(d) => Some(d),
            Self::Pair(d) => Some(d),
            Self::Slice(d) => Some(d),
            Self::Context(d) => Some(d),
        }
    }

    pub fn is_abstraction(&self) -> bool {
        self.as_abstraction().is_some()
    }

    /// Empty for raw definitions.
    pub fn abstracted_from(&self) -> BTreeSet<String> {
        self.as_abstraction()
            .map(|a| a.abstracted_from())
            .unwrap_or_default()
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Event(_) => "event",
            Self::Constant(_) => "constant",
            Self::LowLevel(_) => "low_level",
            Self::HighLevel(_) => "high_level",
            Self::Pair(_) => "pair",
            Self::Slice(_) => "slice",
            Self::Context(_) => "context",
        }
    }
}

impl From<LowLevelAbstractionDefinition> for PropositionDefinition {
    fn from(d: LowLevelAbstractionDefinition) -> Self {
        Self::LowLevel(d)
    }
}

impl From<HighLevelAbstractionDefinition> for PropositionDefinition {
    fn from(d: HighLevelAbstractionDefinition) -> Self {
        Self::HighLevel(d)
    }
}

impl From<PairDefinition> for PropositionDefinition {
    fn from(d: PairDefinition) -> Self {
        Self::Pair(d)
    }
}

impl From<SliceDefinition> for PropositionDefinition {
    fn from(d: SliceDefinition) -> Self {
        Self::Slice(d)
    }
}

impl From<ContextDefinition> for PropositionDefinition {
    fn from(d: ContextDefinition) -> Self {
        Self::Context(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_abstracted_from_both_sides() {
        let pair = PairDefinition::new(
            "p",
            TemporalExtendedPropositionDefinition::new("a"),
            TemporalExtendedPropositionDefinition::new("b"),
            crate::temporal::Relation::new(),
        );
        let def = PropositionDefinition::from(pair);
        assert_eq!(
            def.abstracted_from(),
            BTreeSet::from(["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn composite_contexts_never_concatenate() {
        let def = ContextDefinition::composite("c", ["a", "b"]).with_concatenable(true);
        assert!(!AbstractionDefinition::concatenable(&def));
    }

    #[test]
    fn definitions_round_trip_through_json() {
        let def = PropositionDefinition::from(
            LowLevelAbstractionDefinition::new("bp-high", ["bp"], "valueThreshold")
                .with_value(LowLevelValueDefinition::new("HIGH").with_argument("minThreshold", 140.0)),
        );
        let json = serde_json::to_string(&def).unwrap();
        let back: PropositionDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, def);
    }
}
