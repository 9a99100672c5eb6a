//! Executable rules produced by the compiler.

use std::collections::BTreeSet;
use std::sync::Arc;

use tempora_core::definitions::{
    ContextOffset, LowLevelValueDefinition, PatternOffset, RelationSpec, SliceDefinition,
    TemporalExtendedPropositionDefinition,
};
use tempora_core::proposition::{Proposition, Value};
use tempora_core::temporal::{Distance, GapFunction};
use tempora_core::traits::Algorithm;

/// A pattern slot: the descriptor plus every id it matches after inverse-is-a expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub tepd: TemporalExtendedPropositionDefinition,
    pub matching_ids: BTreeSet<String>,
}

impl Descriptor {
    pub fn matches(&self, proposition: &Proposition) -> bool {
        self.matching_ids.contains(&proposition.id) && self.tepd.accepts(proposition)
    }
}

/// Which consecutive runs of the input sequence an algorithm sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Windowing {
    /// Every start index, sizes from `max` (or the rest of the sequence) down to `min`.
    Sliding { min: usize, max: Option<usize> },
    /// A single window over the whole sequence.
    Whole,
}

pub struct LowLevelRule {
    pub algorithm: Arc<dyn Algorithm>,
    pub algorithm_id: String,
    pub windowing: Windowing,
    pub max_gap_between_values: Option<Distance>,
    /// Candidate values in priority order, with their algorithm arguments.
    pub values: Vec<LowLevelValueDefinition>,
}

impl std::fmt::Debug for LowLevelRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LowLevelRule")
            .field("algorithm_id", &self.algorithm_id)
            .field("windowing", &self.windowing)
            .field("values", &self.values.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternRule {
    pub descriptors: Vec<Descriptor>,
    pub relations: Vec<RelationSpec>,
    pub value: Value,
    pub offset: Option<PatternOffset>,
}

#[derive(Debug)]
pub enum RuleAction {
    /// Retracts live instances named by incoming delete-stamped propositions.
    Delete,
    /// Merges adjacent equal-valued instances of one abstraction.
    Combine { gap_function: GapFunction },
    LowLevel(LowLevelRule),
    /// High-level and pair abstractions.
    Pattern(PatternRule),
    InducedContext {
        inducer: Descriptor,
        offset: ContextOffset,
    },
    Slice {
        definition: SliceDefinition,
        component: Descriptor,
    },
    CompositeContext { sub_contexts: Vec<String> },
}

impl RuleAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Combine { .. } => "combine",
            Self::LowLevel(_) => "low_level",
            Self::Pattern(_) => "pattern",
            Self::InducedContext { .. } => "context",
            Self::Slice { .. } => "slice",
            Self::CompositeContext { .. } => "composite_context",
        }
    }
}

#[derive(Debug)]
pub struct CompiledRule {
    pub id: String,
    /// The definition whose instances the rule produces; empty for the delete rule.
    pub definition_id: String,
    pub salience: i32,
    pub topo_rank: usize,
    pub load_order: usize,
    /// Proposition ids whose changes make this rule dirty.
    pub inputs: BTreeSet<String>,
    pub action: RuleAction,
}

impl CompiledRule {
    /// Set-valued rules recompute their whole output and diff it against what is live.
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self.action,
            RuleAction::Slice { .. } | RuleAction::CompositeContext { .. }
        )
    }

    /// Whether a fired (rule, tuple) pair is remembered and never fires again.
    pub fn refracts(&self) -> bool {
        !self.is_aggregate() && !matches!(self.action, RuleAction::Delete)
    }
}
