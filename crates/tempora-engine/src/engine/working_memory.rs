//! Live facts of one key, indexed by unique id and by proposition id.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tempora_core::proposition::{Proposition, UniqueId};

#[derive(Debug, Clone)]
struct Fact {
    proposition: Arc<Proposition>,
    recency: u64,
}

#[derive(Debug, Default)]
pub struct WorkingMemory {
    live: HashMap<UniqueId, Fact>,
    by_type: BTreeMap<String, BTreeSet<UniqueId>>,
    /// Delete-stamped copies, kept for reference resolution.
    deleted: BTreeMap<UniqueId, Arc<Proposition>>,
    /// Delete-stamped inputs the delete rule has not processed yet.
    pending_deletes: BTreeMap<UniqueId, (Arc<Proposition>, u64)>,
    /// Deletions processed during the current execution, in firing order.
    to_delete: Vec<Arc<Proposition>>,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `proposition` live, replacing any live fact with the same unique id.
    pub fn insert(&mut self, proposition: Arc<Proposition>, recency: u64) -> Option<Arc<Proposition>> {
        let uid = proposition.unique_id.clone();
        let previous = self.retract(&uid);
        self.by_type
            .entry(proposition.id.clone())
            .or_default()
            .insert(uid.clone());
        self.live.insert(
            uid,
            Fact {
                proposition,
                recency,
            },
        );
        previous
    }

    pub fn retract(&mut self, uid: &UniqueId) -> Option<Arc<Proposition>> {
        let fact = self.live.remove(uid)?;
        if let Some(ids) = self.by_type.get_mut(&fact.proposition.id) {
            ids.remove(uid);
            if ids.is_empty() {
                self.by_type.remove(&fact.proposition.id);
            }
        }
        Some(fact.proposition)
    }

    pub fn get(&self, uid: &UniqueId) -> Option<&Arc<Proposition>> {
        self.live.get(uid).map(|f| &f.proposition)
    }

    pub fn is_live(&self, uid: &UniqueId) -> bool {
        self.live.contains_key(uid)
    }

    pub fn recency(&self, uid: &UniqueId) -> u64 {
        self.live.get(uid).map_or(0, |f| f.recency)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Live facts whose proposition id is one of `ids`, in unique id order.
    pub fn of_types(&self, ids: &BTreeSet<String>) -> Vec<Arc<Proposition>> {
        let mut found: Vec<Arc<Proposition>> = ids
            .iter()
            .filter_map(|id| self.by_type.get(id))
            .flatten()
            .filter_map(|uid| self.get(uid).cloned())
            .collect();
        found.sort_by(|a, b| a.unique_id.cmp(&b.unique_id));
        found
    }

    pub fn of_type(&self, id: &str) -> Vec<Arc<Proposition>> {
        self.by_type
            .get(id)
            .map(|uids| uids.iter().filter_map(|uid| self.get(uid).cloned()).collect())
            .unwrap_or_default()
    }

    /// Every live fact with its recency stamp.
    pub fn live(&self) -> impl Iterator<Item = (&Arc<Proposition>, u64)> {
        self.live.values().map(|f| (&f.proposition, f.recency))
    }

    pub fn add_pending_delete(&mut self, marker: Arc<Proposition>, recency: u64) {
        self.pending_deletes
            .insert(marker.unique_id.clone(), (marker, recency));
    }

    pub fn pending_deletes(&self) -> impl Iterator<Item = (&Arc<Proposition>, u64)> {
        self.pending_deletes.values().map(|(p, r)| (p, *r))
    }

    pub fn take_pending_delete(&mut self, uid: &UniqueId) -> Option<Arc<Proposition>> {
        self.pending_deletes.remove(uid).map(|(p, _)| p)
    }

    pub fn is_pending_delete(&self, uid: &UniqueId) -> bool {
        self.pending_deletes.contains_key(uid)
    }

    /// Record a processed deletion.
    pub fn record_deleted(&mut self, copy: Arc<Proposition>) {
        self.deleted.insert(copy.unique_id.clone(), Arc::clone(&copy));
        self.to_delete.push(copy);
    }

    /// Restore a delete-stamped copy from persisted state without reporting it again.
    pub fn restore_deleted(&mut self, copy: Arc<Proposition>) {
        self.deleted.insert(copy.unique_id.clone(), copy);
    }

    pub fn deleted(&self) -> impl Iterator<Item = &Arc<Proposition>> {
        self.deleted.values()
    }

    pub fn to_delete(&self) -> &[Arc<Proposition>] {
        &self.to_delete
    }

    pub fn clear_to_delete(&mut self) {
        self.to_delete.clear();
    }

    pub fn reset(&mut self) {
        self.live.clear();
        self.by_type.clear();
        self.deleted.clear();
        self.pending_deletes.clear();
        self.to_delete.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hr(local: &str, at: i64) -> Arc<Proposition> {
        Arc::new(Proposition::primitive("hr", UniqueId::new("ehr", local), at, 70.0))
    }

    #[test]
    fn insert_replaces_same_unique_id() {
        let mut wm = WorkingMemory::new();
        assert!(wm.insert(hr("1", 0), 1).is_none());
        let previous = wm.insert(hr("1", 5), 2);
        assert!(previous.is_some());
        assert_eq!(wm.len(), 1);
        assert_eq!(wm.recency(&UniqueId::new("ehr", "1")), 2);
    }

    #[test]
    fn retract_clears_type_index() {
        let mut wm = WorkingMemory::new();
        wm.insert(hr("1", 0), 1);
        wm.retract(&UniqueId::new("ehr", "1"));
        assert!(wm.of_type("hr").is_empty());
        assert!(wm.is_empty());
    }
}
