use std::collections::BTreeMap;

use crate::definitions::PropositionDefinition;
use crate::errors::KnowledgeSourceReadError;
use crate::traits::KnowledgeSource;

/// Definitions held in a map by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeSource {
    definitions: BTreeMap<String, PropositionDefinition>,
}

impl InMemoryKnowledgeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later definitions with the same id replace earlier ones.
    pub fn with_definition(mut self, definition: impl Into<PropositionDefinition>) -> Self {
        self.insert(definition);
        self
    }

    pub fn insert(&mut self, definition: impl Into<PropositionDefinition>) {
        let definition = definition.into();
        self.definitions.insert(definition.id().to_string(), definition);
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl FromIterator<PropositionDefinition> for InMemoryKnowledgeSource {
    fn from_iter<T: IntoIterator<Item = PropositionDefinition>>(iter: T) -> Self {
        let mut source = Self::new();
        for definition in iter {
            source.insert(definition);
        }
        source
    }
}

impl KnowledgeSource for InMemoryKnowledgeSource {
    fn read_proposition_definition(
        &self,
        id: &str,
    ) -> Result<Option<PropositionDefinition>, KnowledgeSourceReadError> {
        Ok(self.definitions.get(id).cloned())
    }

    fn read_is_a(&self, id: &str) -> Result<Vec<String>, KnowledgeSourceReadError> {
        Ok(self
            .definitions
            .values()
            .filter(|d| d.inverse_is_a().iter().any(|child| child == id))
            .map(|d| d.id().to_string())
            .collect())
    }
}
