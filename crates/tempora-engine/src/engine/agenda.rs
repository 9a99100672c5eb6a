//! Pending activations in conflict-resolution order.
//!
//! Order: salience (desc), propagation (desc), recency of the newest source (desc),
//! topological rank (asc), load order (asc), activation sequence (asc).

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use tempora_core::proposition::{UniqueId, Value};
use tempora_core::temporal::Interval;

/// One output of a set-valued rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredOutput {
    pub interval: Interval,
    /// `None` produces a context, `Some` an abstract parameter.
    pub value: Option<Value>,
    pub sources: Vec<UniqueId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Delete { marker: UniqueId },
    Combine { first: UniqueId, second: UniqueId },
    Derive { interval: Interval, value: Option<Value> },
    Reconcile { desired: Vec<DesiredOutput> },
}

/// What a rule evaluation proposes, before it is placed on the agenda.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub sources: Vec<UniqueId>,
    pub recency: u64,
    pub payload: Payload,
}

#[derive(Debug, Clone)]
pub struct Activation {
    pub rule: usize,
    pub propagation: u64,
    pub sequence: u64,
    pub candidate: Candidate,
}

type AgendaKey = (Reverse<i32>, Reverse<u64>, Reverse<u64>, usize, usize, u64);

/// Static ordering attributes of the rule behind an activation.
#[derive(Debug, Clone, Copy)]
pub struct RuleRank {
    pub salience: i32,
    pub topo_rank: usize,
    pub load_order: usize,
}

#[derive(Debug, Default)]
pub struct Agenda {
    queue: BTreeMap<AgendaKey, Activation>,
    by_rule: HashMap<usize, Vec<AgendaKey>>,
    sequence: u64,
}

impl Agenda {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Replace the activations of `rule` with `candidates`.
    ///
    /// A candidate identical to one already queued keeps the queued activation, so its
    /// propagation and sequence do not change.
    pub fn replace_rule_activations(
        &mut self,
        rule: usize,
        rank: RuleRank,
        propagation: u64,
        candidates: Vec<Candidate>,
    ) {
        let existing = self.by_rule.remove(&rule).unwrap_or_default();
        let mut kept: Vec<AgendaKey> = Vec::new();
        let mut fresh = candidates;
        for key in existing {
            let Some(activation) = self.queue.get(&key) else {
                continue;
            };
            if let Some(pos) = fresh.iter().position(|c| *c == activation.candidate) {
                fresh.swap_remove(pos);
                kept.push(key);
            } else {
                self.queue.remove(&key);
            }
        }
        for candidate in fresh {
            self.sequence += 1;
            let key = (
                Reverse(rank.salience),
                Reverse(propagation),
                Reverse(candidate.recency),
                rank.topo_rank,
                rank.load_order,
                self.sequence,
            );
            self.queue.insert(
                key,
                Activation {
                    rule,
                    propagation,
                    sequence: self.sequence,
                    candidate,
                },
            );
            kept.push(key);
        }
        if !kept.is_empty() {
            self.by_rule.insert(rule, kept);
        }
    }

    /// Remove and return the highest-ranked activation.
    pub fn pop(&mut self) -> Option<Activation> {
        let (key, activation) = self.queue.pop_first()?;
        if let Some(keys) = self.by_rule.get_mut(&activation.rule) {
            keys.retain(|k| *k != key);
            if keys.is_empty() {
                self.by_rule.remove(&activation.rule);
            }
        }
        Some(activation)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.by_rule.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(local: &str, recency: u64) -> Candidate {
        Candidate {
            sources: vec![UniqueId::new("t", local)],
            recency,
            payload: Payload::Delete {
                marker: UniqueId::new("t", local),
            },
        }
    }

    fn rank(salience: i32, topo_rank: usize, load_order: usize) -> RuleRank {
        RuleRank {
            salience,
            topo_rank,
            load_order,
        }
    }

    #[test]
    fn salience_beats_propagation() {
        let mut agenda = Agenda::new();
        agenda.replace_rule_activations(1, rank(10, 0, 1), 5, vec![candidate("a", 9)]);
        agenda.replace_rule_activations(2, rank(20, 0, 2), 1, vec![candidate("b", 1)]);
        assert_eq!(agenda.pop().unwrap().rule, 2);
        assert_eq!(agenda.pop().unwrap().rule, 1);
    }

    #[test]
    fn newer_propagation_then_recency_then_rank() {
        let mut agenda = Agenda::new();
        agenda.replace_rule_activations(1, rank(10, 0, 1), 1, vec![candidate("old", 9)]);
        agenda.replace_rule_activations(2, rank(10, 3, 2), 2, vec![candidate("low", 1)]);
        agenda.replace_rule_activations(3, rank(10, 1, 3), 2, vec![candidate("high", 4)]);
        agenda.replace_rule_activations(4, rank(10, 0, 4), 2, vec![candidate("tie", 1)]);
        let order: Vec<usize> = std::iter::from_fn(|| agenda.pop()).map(|a| a.rule).collect();
        assert_eq!(order, vec![3, 4, 2, 1]);
    }

    #[test]
    fn identical_candidates_keep_their_place() {
        let mut agenda = Agenda::new();
        agenda.replace_rule_activations(1, rank(10, 0, 1), 1, vec![candidate("a", 1), candidate("b", 1)]);
        agenda.replace_rule_activations(1, rank(10, 0, 1), 7, vec![candidate("b", 1)]);
        assert_eq!(agenda.len(), 1);
        let only = agenda.pop().unwrap();
        assert_eq!(only.propagation, 1);
        assert_eq!(only.candidate.sources[0].local_id, "b");
    }
}
