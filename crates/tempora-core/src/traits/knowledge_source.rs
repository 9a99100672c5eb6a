use crate::definitions::PropositionDefinition;
use crate::errors::KnowledgeSourceReadError;

/// Resolves proposition definitions and their is-a hierarchy.
pub trait KnowledgeSource: Send + Sync {
    fn read_proposition_definition(
        &self,
        id: &str,
    ) -> Result<Option<PropositionDefinition>, KnowledgeSourceReadError>;

    /// Direct parents of `id`.
    fn read_is_a(&self, id: &str) -> Result<Vec<String>, KnowledgeSourceReadError>;

    /// Direct children of `id`.
    fn read_inverse_is_a(&self, id: &str) -> Result<Vec<String>, KnowledgeSourceReadError> {
        Ok(self
            .read_proposition_definition(id)?
            .map(|d| d.inverse_is_a().to_vec())
            .unwrap_or_default())
    }

    /// Ids `id` is abstracted from; empty for raw or unknown definitions.
    fn read_abstracted_from(&self, id: &str) -> Result<Vec<String>, KnowledgeSourceReadError> {
        Ok(self
            .read_proposition_definition(id)?
            .map(|d| d.abstracted_from().into_iter().collect())
            .unwrap_or_default())
    }
}
