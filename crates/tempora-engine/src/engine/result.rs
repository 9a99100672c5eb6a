use std::sync::Arc;

use tempora_core::proposition::{Proposition, UniqueId};
use tempora_core::traits::{DerivationMap, ReferenceIndex};

/// Everything the engine produced for one key.
#[derive(Debug, Clone, Default)]
pub struct KeyResult {
    pub key_id: String,
    /// Live propositions of the requested ids, ordered by id then time.
    pub propositions: Vec<Arc<Proposition>>,
    pub forward: DerivationMap,
    pub backward: DerivationMap,
    pub references: ReferenceIndex,
    /// Delete-stamped copies processed during this execution.
    pub to_delete: Vec<Arc<Proposition>>,
}

impl KeyResult {
    pub fn of_type<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Arc<Proposition>> + 'a {
        self.propositions.iter().filter(move |p| p.id == id)
    }

    pub fn has_deletes(&self) -> bool {
        !self.to_delete.is_empty()
    }

    pub fn derived_from(&self, unique_id: &UniqueId) -> &[Arc<Proposition>] {
        self.backward.get(unique_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn derivations_of(&self, unique_id: &UniqueId) -> &[Arc<Proposition>] {
        self.forward.get(unique_id).map(Vec::as_slice).unwrap_or(&[])
    }
}
