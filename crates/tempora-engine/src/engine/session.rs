//! One key's execution: working memory, derivations, agenda and the fixpoint loop.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use tempora_core::config::EngineConfig;
use tempora_core::errors::ExecutionError;
use tempora_core::proposition::{Proposition, PropositionKind, UniqueId, Value};
use tempora_core::temporal::Interval;

use super::agenda::{Activation, Agenda, DesiredOutput, Payload, RuleRank};
use super::evaluate::{evaluate, sort_temporal};
use super::result::KeyResult;
use super::working_memory::WorkingMemory;
use crate::compiler::{CompiledRule, CompiledRuleSet};
use crate::derivation::{DerivationGraph, DerivationSnapshot};

/// Per-key counters. They restart with every new key and persist with stateful sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub propagation: u64,
    pub recency: u64,
    pub derived: u64,
}

type RefractionKey = (String, Vec<UniqueId>);

/// Persisted working state of a key, minus the derivation graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Live propositions with their recency stamps.
    pub live: Vec<(Proposition, u64)>,
    pub deleted: Vec<Proposition>,
    pub counters: Counters,
    pub refraction: Vec<RefractionKey>,
    /// Current outputs of set-valued rules, by rule id.
    pub aggregate_outputs: BTreeMap<String, Vec<(DesiredOutput, UniqueId)>>,
}

pub struct ExecutionSession<'r> {
    key_id: String,
    rules: &'r CompiledRuleSet,
    max_firings: usize,
    memory: WorkingMemory,
    derivations: DerivationGraph,
    agenda: Agenda,
    counters: Counters,
    refraction: HashSet<RefractionKey>,
    aggregate_outputs: BTreeMap<String, Vec<(DesiredOutput, UniqueId)>>,
    dirty: BTreeSet<usize>,
    firings: usize,
}

impl<'r> ExecutionSession<'r> {
    pub fn new(key_id: &str, rules: &'r CompiledRuleSet, config: &EngineConfig) -> Self {
        Self {
            key_id: key_id.to_string(),
            rules,
            max_firings: config.max_firings_per_key,
            memory: WorkingMemory::new(),
            derivations: DerivationGraph::new(),
            agenda: Agenda::new(),
            counters: Counters::default(),
            refraction: HashSet::new(),
            aggregate_outputs: BTreeMap::new(),
            dirty: BTreeSet::new(),
            firings: 0,
        }
    }

    /// Continue from persisted state.
    pub fn restore(
        key_id: &str,
        rules: &'r CompiledRuleSet,
        config: &EngineConfig,
        snapshot: SessionSnapshot,
        derivations: &DerivationSnapshot,
    ) -> Self {
        let mut session = Self::new(key_id, rules, config);
        for (proposition, recency) in snapshot.live {
            session.memory.insert(Arc::new(proposition), recency);
        }
        for copy in snapshot.deleted {
            session.memory.restore_deleted(Arc::new(copy));
        }
        session.counters = snapshot.counters;
        session.refraction = snapshot.refraction.into_iter().collect();
        session.aggregate_outputs = snapshot.aggregate_outputs;
        session.derivations.restore(derivations);
        debug!(
            key_id,
            live = session.memory.len(),
            edges = session.derivations.edge_count(),
            "session restored"
        );
        session
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn firings(&self) -> usize {
        self.firings
    }

    pub fn memory(&self) -> &WorkingMemory {
        &self.memory
    }

    pub fn derivations(&self) -> &DerivationGraph {
        &self.derivations
    }

    pub fn assert_all(&mut self, propositions: impl IntoIterator<Item = Proposition>) {
        for proposition in propositions {
            self.assert(proposition);
        }
    }

    /// Add an incoming fact. Delete-stamped facts queue a deletion; a fact whose unique id is
    /// already live with different content replaces it.
    pub fn assert(&mut self, proposition: Proposition) {
        let recency = self.next_recency();
        if proposition.is_deleted() {
            self.memory.add_pending_delete(Arc::new(proposition), recency);
            self.dirty.insert(self.rules.delete_rule());
            return;
        }
        if self
            .memory
            .get(&proposition.unique_id)
            .is_some_and(|live| **live == proposition)
        {
            return;
        }
        let proposition = Arc::new(proposition);
        if let Some(previous) = self.memory.insert(Arc::clone(&proposition), recency) {
            trace!(key_id = %self.key_id, unique_id = %proposition.unique_id, "fact updated");
            self.retract_dependents(&previous);
            self.derivations.refresh(&proposition);
            let uid = &proposition.unique_id;
            self.refraction.retain(|(_, sources)| !sources.contains(uid));
            self.mark_changed(&previous.id);
        }
        self.mark_changed(&proposition.id);
    }

    /// Fire rules until nothing is dirty and the agenda is empty.
    pub fn run(&mut self) -> Result<(), ExecutionError> {
        let rules = self.rules;
        loop {
            if !self.dirty.is_empty() {
                self.counters.propagation += 1;
                for index in std::mem::take(&mut self.dirty) {
                    self.reevaluate(rules.rule(index), index)?;
                }
            }
            let Some(activation) = self.agenda.pop() else {
                break;
            };
            let rule = rules.rule(activation.rule);
            if !self.is_current(rule, &activation) {
                trace!(key_id = %self.key_id, rule = %rule.id, "stale activation discarded");
                continue;
            }
            self.firings += 1;
            if self.firings > self.max_firings {
                return Err(ExecutionError::FiringLimitExceeded {
                    key_id: self.key_id.clone(),
                    limit: self.max_firings,
                });
            }
            debug!(
                key_id = %self.key_id,
                rule = %rule.id,
                propagation = activation.propagation,
                sources = activation.candidate.sources.len(),
                "rule fired"
            );
            let changed = self.fire(rule, activation)?;
            for id in changed {
                self.mark_changed(&id);
            }
        }
        debug!(
            key_id = %self.key_id,
            firings = self.firings,
            live = self.memory.len(),
            "fixpoint reached"
        );
        Ok(())
    }

    fn reevaluate(&mut self, rule: &CompiledRule, index: usize) -> Result<(), ExecutionError> {
        let current: Vec<DesiredOutput> = self
            .aggregate_outputs
            .get(&rule.id)
            .map(|outputs| outputs.iter().map(|(d, _)| d.clone()).collect())
            .unwrap_or_default();
        let mut candidates = evaluate(rule, &self.memory, &current)?;
        if rule.refracts() {
            candidates.retain(|c| {
                !self
                    .refraction
                    .contains(&(rule.id.clone(), c.sources.clone()))
            });
        }
        trace!(
            key_id = %self.key_id,
            rule = %rule.id,
            candidates = candidates.len(),
            "rule evaluated"
        );
        let rank = RuleRank {
            salience: rule.salience,
            topo_rank: rule.topo_rank,
            load_order: rule.load_order,
        };
        self.agenda
            .replace_rule_activations(index, rank, self.counters.propagation, candidates);
        Ok(())
    }

    fn is_current(&self, rule: &CompiledRule, activation: &Activation) -> bool {
        if let Payload::Delete { marker } = &activation.candidate.payload {
            return self.memory.is_pending_delete(marker);
        }
        if rule.refracts()
            && self
                .refraction
                .contains(&(rule.id.clone(), activation.candidate.sources.clone()))
        {
            return false;
        }
        activation
            .candidate
            .sources
            .iter()
            .all(|uid| self.memory.is_live(uid))
    }

    fn mark_changed(&mut self, proposition_id: &str) {
        self.dirty
            .extend(self.rules.rules_consuming(proposition_id).iter().copied());
    }

    /// Transitively retract the facts derived from `source` so they are re-derived from the
    /// current facts. Outputs of set-valued rules are left to their reconciliation.
    fn retract_dependents(&mut self, source: &Proposition) {
        let rules = self.rules;
        let mut pending = self.derivations.forward(source);
        while let Some(dependent) = pending.pop() {
            if self.is_aggregate_output(&dependent.unique_id) {
                continue;
            }
            let Some(live) = self.memory.retract(&dependent.unique_id) else {
                continue;
            };
            let inputs: BTreeSet<UniqueId> = self
                .derivations
                .backward(&live)
                .iter()
                .map(|p| p.unique_id.clone())
                .collect();
            let producers: BTreeSet<&str> = rules
                .rules()
                .iter()
                .filter(|r| r.refracts() && r.definition_id == live.id)
                .map(|r| r.id.as_str())
                .collect();
            self.refraction.retain(|(rule_id, sources)| {
                !(producers.contains(rule_id.as_str()) && sources.iter().all(|s| inputs.contains(s)))
            });
            pending.extend(self.derivations.forward(&live));
            self.derivations.remove(&live);
            trace!(key_id = %self.key_id, unique_id = %live.unique_id, "derived fact retracted");
            self.mark_changed(&live.id);
        }
    }

    fn is_aggregate_output(&self, uid: &UniqueId) -> bool {
        self.aggregate_outputs
            .values()
            .any(|outputs| outputs.iter().any(|(_, output)| output == uid))
    }

    fn next_recency(&mut self) -> u64 {
        self.counters.recency += 1;
        self.counters.recency
    }

    fn next_derived(&mut self, definition_id: &str) -> UniqueId {
        self.counters.derived += 1;
        UniqueId::derived(definition_id, self.counters.derived)
    }

    /// Create and assert a derived proposition with edges from `sources`.
    fn derive(
        &mut self,
        definition_id: &str,
        interval: Interval,
        value: Option<Value>,
        sources: &[UniqueId],
    ) -> Arc<Proposition> {
        let uid = self.next_derived(definition_id);
        let kind = match value {
            Some(value) => PropositionKind::AbstractParameter { interval, value },
            None => PropositionKind::Context { interval },
        };
        let derived = Arc::new(Proposition::new(definition_id, uid, kind));
        let recency = self.next_recency();
        self.memory.insert(Arc::clone(&derived), recency);
        for source in sources {
            if let Some(source) = self.memory.get(source).cloned() {
                self.derivations.proposition_asserted(&source, &derived);
            }
        }
        derived
    }

    /// Apply an activation. Returns the proposition ids whose instances changed.
    fn fire(
        &mut self,
        rule: &CompiledRule,
        activation: Activation,
    ) -> Result<BTreeSet<String>, ExecutionError> {
        let mut changed = BTreeSet::new();
        let sources = activation.candidate.sources;
        match activation.candidate.payload {
            Payload::Delete { marker } => {
                let Some(marker) = self.memory.take_pending_delete(&marker) else {
                    return Ok(changed);
                };
                if let Some(live) = self.memory.retract(&marker.unique_id) {
                    self.derivations.repoint(&live, &marker);
                    changed.insert(live.id.clone());
                }
                debug!(key_id = %self.key_id, unique_id = %marker.unique_id, "proposition deleted");
                self.memory.record_deleted(marker);
            }
            Payload::Combine { first, second } => {
                let (Some(a), Some(b)) = (self.memory.retract(&first), self.memory.retract(&second))
                else {
                    return Ok(changed);
                };
                let (Some(a_interval), Some(b_interval)) = (a.interval(), b.interval()) else {
                    return Ok(changed);
                };
                self.retract_dependents(&a);
                self.retract_dependents(&b);
                let interval = a_interval.span(b_interval);
                let uid = self.next_derived(&rule.definition_id);
                let kind = match &a.kind {
                    PropositionKind::AbstractParameter { value, .. } => {
                        PropositionKind::AbstractParameter {
                            interval,
                            value: value.clone(),
                        }
                    }
                    PropositionKind::PrimitiveParameter { value, .. } => {
                        PropositionKind::PrimitiveParameter {
                            interval,
                            value: value.clone(),
                        }
                    }
                    PropositionKind::Event { .. } => PropositionKind::Event { interval },
                    PropositionKind::Context { .. } | PropositionKind::Constant => {
                        PropositionKind::Context { interval }
                    }
                };
                let merged = Arc::new(Proposition::new(rule.definition_id.clone(), uid, kind));
                let recency = self.next_recency();
                self.memory.insert(Arc::clone(&merged), recency);
                self.derivations.repoint(&a, &merged);
                self.derivations.repoint(&b, &merged);
                self.refraction.insert((rule.id.clone(), sources));
                changed.insert(rule.definition_id.clone());
            }
            Payload::Derive { interval, value } => {
                self.derive(&rule.definition_id, interval, value, &sources);
                self.refraction.insert((rule.id.clone(), sources));
                changed.insert(rule.definition_id.clone());
            }
            Payload::Reconcile { desired } => {
                let mut current = self.aggregate_outputs.remove(&rule.id).unwrap_or_default();
                let mut next = Vec::with_capacity(desired.len());
                for output in desired {
                    if let Some(pos) = current.iter().position(|(c, _)| *c == output) {
                        next.push(current.swap_remove(pos));
                        continue;
                    }
                    let derived = self.derive(
                        &rule.definition_id,
                        output.interval,
                        output.value.clone(),
                        &output.sources,
                    );
                    next.push((output, derived.unique_id.clone()));
                }
                for (_, uid) in current {
                    if let Some(stale) = self.memory.retract(&uid) {
                        self.retract_dependents(&stale);
                        self.derivations.remove(&stale);
                    }
                }
                self.aggregate_outputs.insert(rule.id.clone(), next);
                changed.insert(rule.definition_id.clone());
            }
        }
        Ok(changed)
    }

    /// Live propositions (restricted to the requested ids), edges, references and deletions.
    pub fn result(&self) -> KeyResult {
        let output_ids = self.rules.output_ids();
        let mut propositions: Vec<Arc<Proposition>> = self
            .memory
            .live()
            .filter(|(p, _)| output_ids.is_empty() || output_ids.contains(&p.id))
            .map(|(p, _)| Arc::clone(p))
            .collect();
        sort_temporal(&mut propositions);
        propositions.sort_by(|a, b| a.id.cmp(&b.id));

        let mut references: BTreeMap<UniqueId, Arc<Proposition>> = self
            .memory
            .live()
            .map(|(p, _)| (p.unique_id.clone(), Arc::clone(p)))
            .collect();
        for copy in self.memory.deleted() {
            references
                .entry(copy.unique_id.clone())
                .or_insert_with(|| Arc::clone(copy));
        }

        KeyResult {
            key_id: self.key_id.clone(),
            propositions,
            forward: self.derivations.forward_map(),
            backward: self.derivations.backward_map(),
            references,
            to_delete: self.memory.to_delete().to_vec(),
        }
    }

    pub fn snapshot(&self) -> (SessionSnapshot, DerivationSnapshot) {
        let mut live: Vec<(Proposition, u64)> = self
            .memory
            .live()
            .map(|(p, recency)| (Proposition::clone(p), recency))
            .collect();
        live.sort_by_key(|(_, recency)| *recency);
        let mut refraction: Vec<RefractionKey> = self.refraction.iter().cloned().collect();
        refraction.sort();
        let session = SessionSnapshot {
            live,
            deleted: self
                .memory
                .deleted()
                .map(|p| Proposition::clone(p))
                .collect(),
            counters: self.counters,
            refraction,
            aggregate_outputs: self.aggregate_outputs.clone(),
        };
        (session, self.derivations.snapshot())
    }

    /// Discard every fact and edge; counters restart.
    pub fn reset(&mut self) {
        self.memory.reset();
        self.derivations.reset();
        self.agenda.clear();
        self.counters = Counters::default();
        self.refraction.clear();
        self.aggregate_outputs.clear();
        self.dirty.clear();
        self.firings = 0;
    }
}
