//! Abstraction compiler: definitions in, ordered executable rules out.

pub mod closure;
pub mod rules;
pub mod topology;
pub mod validation;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use tempora_core::constants::{
    SALIENCE_AGGREGATE, SALIENCE_COMBINE, SALIENCE_DELETE, SALIENCE_DERIVE,
};
use tempora_core::definitions::{
    AbstractionDefinition, ContextKind, PatternOffset, PropositionDefinition, RelationSpec,
    TemporalExtendedPropositionDefinition, WindowSizing,
};
use tempora_core::errors::CompileError;
use tempora_core::proposition::Value;
use tempora_core::traits::{AlgorithmSource, KnowledgeSource};

use closure::Closure;
pub use rules::{CompiledRule, Descriptor, LowLevelRule, PatternRule, RuleAction, Windowing};
pub use topology::TopologicalOrder;

/// Compiles abstraction definitions read from a knowledge source.
pub struct AbstractionCompiler<'a> {
    knowledge: &'a dyn KnowledgeSource,
    algorithms: &'a dyn AlgorithmSource,
}

impl<'a> AbstractionCompiler<'a> {
    pub fn new(knowledge: &'a dyn KnowledgeSource, algorithms: &'a dyn AlgorithmSource) -> Self {
        Self {
            knowledge,
            algorithms,
        }
    }

    /// Resolve, validate, order and build rules for `requested` and everything it needs.
    pub fn compile(&self, requested: &BTreeSet<String>) -> Result<CompiledRuleSet, CompileError> {
        let closure = Closure::resolve(self.knowledge, requested)?;

        for definition in closure.definitions.values() {
            match definition {
                PropositionDefinition::HighLevel(d) => validation::validate_high_level(d)?,
                PropositionDefinition::Pair(d) => validation::validate_pattern(
                    &d.id,
                    &[d.lhs.clone(), d.rhs.clone()],
                    &d.to_pattern().relations,
                )?,
                PropositionDefinition::Slice(d) => validation::validate_slice(d)?,
                PropositionDefinition::Context(d) => validation::validate_context(d, &closure)?,
                // Low-level definitions are validated while building, which resolves the algorithm.
                _ => {}
            }
        }

        let order = topology::order(&closure)?;
        let mut builder = RuleBuilder::new(&closure);
        builder.push(
            "delete".to_string(),
            String::new(),
            SALIENCE_DELETE,
            0,
            BTreeSet::new(),
            RuleAction::Delete,
        );

        for id in &order.order {
            let Some(definition) = closure.get(id) else {
                continue;
            };
            let rank = order.rank[id];
            if let Some(abstraction) = definition.as_abstraction() {
                if abstraction.concatenable() {
                    builder.push(
                        format!("{id}:combine"),
                        id.clone(),
                        SALIENCE_COMBINE,
                        rank,
                        BTreeSet::from([id.clone()]),
                        RuleAction::Combine {
                            gap_function: abstraction.gap_function().clone(),
                        },
                    );
                }
            }
            self.build_derivation(&mut builder, definition, rank)?;
        }

        let rules = builder.rules;
        let mut by_input: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, rule) in rules.iter().enumerate() {
            for input in &rule.inputs {
                by_input.entry(input.clone()).or_default().push(index);
            }
        }
        let output_ids = requested
            .iter()
            .flat_map(|id| closure.expand(id))
            .collect();

        info!(
            requested = requested.len(),
            definitions = closure.definitions.len(),
            rules = rules.len(),
            raw_ids = closure.raw_ids.len(),
            "rules compiled"
        );
        Ok(CompiledRuleSet {
            rules,
            by_input,
            raw_proposition_ids: closure.raw_ids.clone(),
            output_ids,
            order,
        })
    }

    fn build_derivation(
        &self,
        builder: &mut RuleBuilder<'_>,
        definition: &PropositionDefinition,
        rank: usize,
    ) -> Result<(), CompileError> {
        let id = definition.id().to_string();
        match definition {
            PropositionDefinition::Primitive(_)
            | PropositionDefinition::Event(_)
            | PropositionDefinition::Constant(_) => {}
            PropositionDefinition::LowLevel(d) => {
                let algorithm =
                    validation::validate_low_level(d, builder.closure, self.algorithms)?;
                let windowing = match d.window {
                    WindowSizing::AlgorithmDefault => Windowing::Sliding {
                        min: algorithm.min_window().max(1),
                        max: algorithm.max_window(),
                    },
                    WindowSizing::WholeSequence => Windowing::Whole,
                    WindowSizing::Explicit { min, max } => Windowing::Sliding {
                        min,
                        max: Some(max),
                    },
                };
                let inputs = d
                    .abstracted_from
                    .iter()
                    .flat_map(|source| builder.closure.expand(source))
                    .collect();
                builder.push(
                    format!("{id}:derive"),
                    id,
                    SALIENCE_DERIVE,
                    rank,
                    inputs,
                    RuleAction::LowLevel(LowLevelRule {
                        algorithm_id: d.algorithm_id.clone(),
                        algorithm,
                        windowing,
                        max_gap_between_values: d.max_gap_between_values,
                        values: d.values.clone(),
                    }),
                );
            }
            PropositionDefinition::HighLevel(d) => {
                let rule = builder.pattern_rule(
                    &d.extended,
                    d.relations.clone(),
                    d.output_value(),
                    d.offset.clone(),
                );
                builder.push_pattern(id, rank, rule);
            }
            PropositionDefinition::Pair(d) => {
                let pattern = d.to_pattern();
                let rule = builder.pattern_rule(
                    &pattern.extended,
                    pattern.relations.clone(),
                    pattern.output_value(),
                    None,
                );
                builder.push_pattern(id, rank, rule);
            }
            PropositionDefinition::Slice(d) => {
                let component = builder.descriptor(&d.component);
                builder.push(
                    format!("{id}:slice"),
                    id,
                    SALIENCE_AGGREGATE,
                    rank,
                    component.matching_ids.clone(),
                    RuleAction::Slice {
                        definition: d.clone(),
                        component,
                    },
                );
            }
            PropositionDefinition::Context(d) => match &d.kind {
                ContextKind::Induced { inducer, offset } => {
                    let inducer = builder.descriptor(inducer);
                    builder.push(
                        format!("{id}:context"),
                        id,
                        SALIENCE_DERIVE,
                        rank,
                        inducer.matching_ids.clone(),
                        RuleAction::InducedContext {
                            inducer,
                            offset: offset.clone(),
                        },
                    );
                }
                ContextKind::Composite { sub_contexts } => {
                    builder.push(
                        format!("{id}:context"),
                        id,
                        SALIENCE_AGGREGATE,
                        rank,
                        d.abstracted_from(),
                        RuleAction::CompositeContext {
                            sub_contexts: sub_contexts.clone(),
                        },
                    );
                }
            },
        }
        Ok(())
    }
}

struct RuleBuilder<'c> {
    closure: &'c Closure,
    rules: Vec<CompiledRule>,
}

impl<'c> RuleBuilder<'c> {
    fn new(closure: &'c Closure) -> Self {
        Self {
            closure,
            rules: Vec::new(),
        }
    }

    fn push(
        &mut self,
        id: String,
        definition_id: String,
        salience: i32,
        topo_rank: usize,
        inputs: BTreeSet<String>,
        action: RuleAction,
    ) {
        debug!(rule = %id, salience, topo_rank, kind = action.kind_name(), "rule built");
        let load_order = self.rules.len();
        self.rules.push(CompiledRule {
            id,
            definition_id,
            salience,
            topo_rank,
            load_order,
            inputs,
            action,
        });
    }

    fn descriptor(&self, tepd: &TemporalExtendedPropositionDefinition) -> Descriptor {
        Descriptor {
            tepd: tepd.clone(),
            matching_ids: self.closure.expand(&tepd.proposition_id),
        }
    }

    fn pattern_rule(
        &self,
        extended: &[TemporalExtendedPropositionDefinition],
        relations: Vec<RelationSpec>,
        value: Value,
        offset: Option<PatternOffset>,
    ) -> PatternRule {
        PatternRule {
            descriptors: extended.iter().map(|e| self.descriptor(e)).collect(),
            relations,
            value,
            offset,
        }
    }

    fn push_pattern(&mut self, id: String, rank: usize, rule: PatternRule) {
        let inputs = rule
            .descriptors
            .iter()
            .flat_map(|d| d.matching_ids.iter().cloned())
            .collect();
        self.push(
            format!("{id}:derive"),
            id,
            SALIENCE_DERIVE,
            rank,
            inputs,
            RuleAction::Pattern(rule),
        );
    }
}

/// The output of compilation: rules in load order plus the lookups the engine needs.
#[derive(Debug)]
pub struct CompiledRuleSet {
    rules: Vec<CompiledRule>,
    by_input: BTreeMap<String, Vec<usize>>,
    raw_proposition_ids: BTreeSet<String>,
    output_ids: BTreeSet<String>,
    order: TopologicalOrder,
}

impl CompiledRuleSet {
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> &CompiledRule {
        &self.rules[index]
    }

    /// Indices of rules that consume `proposition_id`.
    pub fn rules_consuming(&self, proposition_id: &str) -> &[usize] {
        self.by_input
            .get(proposition_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Index of the built-in delete rule.
    pub fn delete_rule(&self) -> usize {
        0
    }

    /// Raw proposition ids the data sources must supply.
    pub fn raw_proposition_ids(&self) -> &BTreeSet<String> {
        &self.raw_proposition_ids
    }

    /// Requested ids plus their inverse-is-a children. Empty means "everything".
    pub fn output_ids(&self) -> &BTreeSet<String> {
        &self.output_ids
    }

    pub fn topological_order(&self) -> &[String] {
        &self.order.order
    }
}
