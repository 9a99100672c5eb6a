//! Forward and backward derivation edges, kept symmetric.
//!
//! An edge `old -> new` means `new` was derived from `old`. Every mutation updates both
//! directions, so `new ∈ forward(old) ⇔ old ∈ backward(new)` holds after each call.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tempora_core::proposition::{Proposition, UniqueId};
use tempora_core::traits::DerivationMap;

type Edges = HashMap<UniqueId, BTreeMap<UniqueId, Arc<Proposition>>>;

#[derive(Debug, Clone, Default)]
pub struct DerivationGraph {
    forward: Edges,
    backward: Edges,
}

/// Serializable form of the graph for stateful persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivationSnapshot {
    /// `(derived_from, derived)` pairs.
    pub edges: Vec<(Proposition, Proposition)>,
}

fn insert(edges: &mut Edges, anchor: &UniqueId, target: Arc<Proposition>) {
    edges
        .entry(anchor.clone())
        .or_default()
        .insert(target.unique_id.clone(), target);
}

fn remove(edges: &mut Edges, anchor: &UniqueId, target: &UniqueId) -> Option<Arc<Proposition>> {
    let targets = edges.get_mut(anchor)?;
    let removed = targets.remove(target);
    if targets.is_empty() {
        edges.remove(anchor);
    }
    removed
}

impl DerivationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `new` was derived from `old`.
    pub fn proposition_asserted(&mut self, old: &Arc<Proposition>, new: &Arc<Proposition>) {
        insert(&mut self.forward, &old.unique_id, Arc::clone(new));
        insert(&mut self.backward, &new.unique_id, Arc::clone(old));
    }

    /// Remove and return everything derived from `p`.
    pub fn proposition_retracted_forward(&mut self, p: &Proposition) -> Vec<Arc<Proposition>> {
        let removed: Vec<Arc<Proposition>> = self
            .forward
            .remove(&p.unique_id)
            .map(|targets| targets.into_values().collect())
            .unwrap_or_default();
        for derived in &removed {
            remove(&mut self.backward, &derived.unique_id, &p.unique_id);
        }
        removed
    }

    /// Remove and return everything `p` was derived from.
    pub fn proposition_retracted_backward(&mut self, p: &Proposition) -> Vec<Arc<Proposition>> {
        let removed: Vec<Arc<Proposition>> = self
            .backward
            .remove(&p.unique_id)
            .map(|sources| sources.into_values().collect())
            .unwrap_or_default();
        for source in &removed {
            remove(&mut self.forward, &source.unique_id, &p.unique_id);
        }
        removed
    }

    /// In `anchor`'s forward set, replace `old` with `new`. No-op when `old` is absent.
    pub fn proposition_replace_forward(
        &mut self,
        anchor: &Arc<Proposition>,
        old: &Proposition,
        new: &Arc<Proposition>,
    ) {
        if remove(&mut self.forward, &anchor.unique_id, &old.unique_id).is_none() {
            return;
        }
        remove(&mut self.backward, &old.unique_id, &anchor.unique_id);
        self.proposition_asserted(anchor, new);
    }

    /// In `anchor`'s backward set, replace `old` with `new`. No-op when `old` is absent.
    pub fn proposition_replace_backward(
        &mut self,
        anchor: &Arc<Proposition>,
        old: &Proposition,
        new: &Arc<Proposition>,
    ) {
        if remove(&mut self.backward, &anchor.unique_id, &old.unique_id).is_none() {
            return;
        }
        remove(&mut self.forward, &old.unique_id, &anchor.unique_id);
        self.proposition_asserted(new, anchor);
    }

    /// Move every edge touching `old` onto `new`, in both directions.
    pub fn repoint(&mut self, old: &Proposition, new: &Arc<Proposition>) {
        for derived in self.forward(old) {
            self.proposition_replace_backward(&derived, old, new);
        }
        for source in self.backward(old) {
            self.proposition_replace_forward(&source, old, new);
        }
    }

    /// Drop `p` and all its edges.
    pub fn remove(&mut self, p: &Proposition) {
        self.proposition_retracted_forward(p);
        self.proposition_retracted_backward(p);
    }

    pub fn forward(&self, p: &Proposition) -> Vec<Arc<Proposition>> {
        self.forward
            .get(&p.unique_id)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn backward(&self, p: &Proposition) -> Vec<Arc<Proposition>> {
        self.backward
            .get(&p.unique_id)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeMap::len).sum()
    }

    pub fn reset(&mut self) {
        self.forward.clear();
        self.backward.clear();
    }

    pub fn forward_map(&self) -> DerivationMap {
        to_map(&self.forward)
    }

    pub fn backward_map(&self) -> DerivationMap {
        to_map(&self.backward)
    }

    /// Edges in a deterministic order.
    pub fn snapshot(&self) -> DerivationSnapshot {
        let mut anchors: Vec<&UniqueId> = self.forward.keys().collect();
        anchors.sort();
        let mut edges = Vec::new();
        for anchor in anchors {
            for derived in self.forward[anchor].values() {
                let source = self
                    .backward
                    .get(&derived.unique_id)
                    .and_then(|sources| sources.get(anchor));
                if let Some(source) = source {
                    edges.push((Proposition::clone(source), Proposition::clone(derived)));
                }
            }
        }
        DerivationSnapshot { edges }
    }

    /// Replace the graph with `snapshot`'s edges.
    pub fn restore(&mut self, snapshot: &DerivationSnapshot) {
        self.reset();
        let mut interned: HashMap<UniqueId, Arc<Proposition>> = HashMap::new();
        let mut intern = |p: &Proposition| -> Arc<Proposition> {
            Arc::clone(
                interned
                    .entry(p.unique_id.clone())
                    .or_insert_with(|| Arc::new(p.clone())),
            )
        };
        for (from, to) in &snapshot.edges {
            let from = intern(from);
            let to = intern(to);
            self.proposition_asserted(&from, &to);
        }
    }

    /// Swap the stored copy of a proposition for `current` wherever it appears.
    pub fn refresh(&mut self, current: &Arc<Proposition>) {
        let id = &current.unique_id;
        let derived: Vec<UniqueId> = self
            .forward
            .get(id)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        for d in derived {
            if let Some(sources) = self.backward.get_mut(&d) {
                sources.insert(id.clone(), Arc::clone(current));
            }
        }
        let sources: Vec<UniqueId> = self
            .backward
            .get(id)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        for s in sources {
            if let Some(targets) = self.forward.get_mut(&s) {
                targets.insert(id.clone(), Arc::clone(current));
            }
        }
    }

    /// Whether the two directions mirror each other exactly.
    pub fn is_symmetric(&self) -> bool {
        let forward_ok = self.forward.iter().all(|(from, targets)| {
            targets.keys().all(|to| {
                self.backward
                    .get(to)
                    .is_some_and(|sources| sources.contains_key(from))
            })
        });
        let backward_ok = self.backward.iter().all(|(to, sources)| {
            sources.keys().all(|from| {
                self.forward
                    .get(from)
                    .is_some_and(|targets| targets.contains_key(to))
            })
        });
        forward_ok && backward_ok
    }
}

fn to_map(edges: &Edges) -> DerivationMap {
    edges
        .iter()
        .map(|(anchor, targets)| (anchor.clone(), targets.values().cloned().collect()))
        .collect()
}
