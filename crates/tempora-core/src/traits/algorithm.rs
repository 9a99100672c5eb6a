//! Algorithms classify windows of primitive parameters for low-level abstractions.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{AlgorithmError, AlgorithmSourceReadError};
use crate::proposition::{Proposition, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmParameter {
    pub name: String,
    pub required: bool,
}

impl AlgorithmParameter {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}

pub trait Algorithm: Send + Sync {
    fn id(&self) -> &str;

    fn parameters(&self) -> &[AlgorithmParameter];

    /// Smallest window the algorithm accepts by default.
    fn min_window(&self) -> usize {
        1
    }

    /// Largest window by default; `None` means the whole sequence.
    fn max_window(&self) -> Option<usize> {
        Some(1)
    }

    /// Classify `window` (temporally ordered). `None` means the window does not qualify.
    fn compute(
        &self,
        window: &[&Proposition],
        arguments: &BTreeMap<String, Value>,
    ) -> Result<Option<Value>, AlgorithmError>;
}

pub trait AlgorithmSource: Send + Sync {
    fn read_algorithm(
        &self,
        id: &str,
    ) -> Result<Option<Arc<dyn Algorithm>>, AlgorithmSourceReadError>;

    fn read_algorithms(&self) -> Result<Vec<Arc<dyn Algorithm>>, AlgorithmSourceReadError>;
}
