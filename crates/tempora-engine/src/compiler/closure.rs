//! Resolves every definition reachable from the requested ids.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tempora_core::definitions::PropositionDefinition;
use tempora_core::errors::CompileError;
use tempora_core::traits::KnowledgeSource;

/// Definitions the rules need, plus the is-a hierarchy among them.
#[derive(Debug, Clone, Default)]
pub struct Closure {
    pub definitions: BTreeMap<String, PropositionDefinition>,
    /// Direct inverse-is-a children per id.
    pub children: BTreeMap<String, Vec<String>>,
    /// Ids data sources must supply.
    pub raw_ids: BTreeSet<String>,
}

impl Closure {
    /// Follow `abstracted_from` and inverse-is-a edges from `requested`.
    pub fn resolve(
        knowledge: &dyn KnowledgeSource,
        requested: &BTreeSet<String>,
    ) -> Result<Self, CompileError> {
        let mut closure = Self::default();
        let mut queue: VecDeque<String> = requested.iter().cloned().collect();
        let mut seen: BTreeSet<String> = requested.clone();

        while let Some(id) = queue.pop_front() {
            let definition = knowledge
                .read_proposition_definition(&id)?
                .ok_or_else(|| CompileError::UnknownProposition { id: id.clone() })?;

            let children = knowledge.read_inverse_is_a(&id)?;
            let mut next: Vec<String> = children.clone();
            next.extend(definition.abstracted_from());

            if !definition.is_abstraction() {
                closure.raw_ids.insert(id.clone());
            }
            closure.children.insert(id.clone(), children);
            closure.definitions.insert(id, definition);

            for dep in next {
                if seen.insert(dep.clone()) {
                    queue.push_back(dep);
                }
            }
        }
        Ok(closure)
    }

    /// `id` and all of its transitive inverse-is-a children.
    pub fn expand(&self, id: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if !out.insert(current.clone()) {
                continue;
            }
            if let Some(children) = self.children.get(&current) {
                stack.extend(children.iter().cloned());
            }
        }
        out
    }

    pub fn get(&self, id: &str) -> Option<&PropositionDefinition> {
        self.definitions.get(id)
    }
}
