use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::AlgorithmSourceReadError;
use crate::traits::{Algorithm, AlgorithmSource};

/// Algorithms registered by id.
#[derive(Clone, Default)]
pub struct InMemoryAlgorithmSource {
    algorithms: BTreeMap<String, Arc<dyn Algorithm>>,
}

impl InMemoryAlgorithmSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithm(mut self, algorithm: Arc<dyn Algorithm>) -> Self {
        self.register(algorithm);
        self
    }

    pub fn register(&mut self, algorithm: Arc<dyn Algorithm>) {
        self.algorithms.insert(algorithm.id().to_string(), algorithm);
    }
}

impl std::fmt::Debug for InMemoryAlgorithmSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAlgorithmSource")
            .field("algorithms", &self.algorithms.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AlgorithmSource for InMemoryAlgorithmSource {
    fn read_algorithm(
        &self,
        id: &str,
    ) -> Result<Option<Arc<dyn Algorithm>>, AlgorithmSourceReadError> {
        Ok(self.algorithms.get(id).cloned())
    }

    fn read_algorithms(&self) -> Result<Vec<Arc<dyn Algorithm>>, AlgorithmSourceReadError> {
        Ok(self.algorithms.values().cloned().collect())
    }
}
