//! Rule-compilation errors. All of them are fatal to query setup.

use super::error_code::{self, TemporaErrorCode};
use super::{AlgorithmSourceReadError, KnowledgeSourceReadError};

/// Errors turning abstraction definitions into executable rules.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("unknown proposition definition: {id}")]
    UnknownProposition { id: String },

    #[error("unknown algorithm {algorithm_id} referenced by {definition_id}")]
    UnknownAlgorithm {
        definition_id: String,
        algorithm_id: String,
    },

    #[error("definition {definition_id} is missing required algorithm argument {parameter}")]
    MissingArgument {
        definition_id: String,
        parameter: String,
    },

    #[error("invalid definition {definition_id}: {reason}")]
    InvalidDefinition {
        definition_id: String,
        reason: String,
    },

    #[error("definition {definition_id} has indistinguishable descriptors {first} and {second}")]
    AmbiguousDescriptors {
        definition_id: String,
        first: usize,
        second: usize,
    },

    #[error("cyclic abstraction dependency: {cycle}")]
    CyclicDependency { cycle: String },

    #[error("knowledge source error: {0}")]
    KnowledgeSource(#[from] KnowledgeSourceReadError),

    #[error("algorithm source error: {0}")]
    AlgorithmSource(#[from] AlgorithmSourceReadError),
}

impl TemporaErrorCode for CompileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::CyclicDependency { .. } => error_code::CYCLIC_DEPENDENCY,
            Self::KnowledgeSource(e) => e.error_code(),
            Self::AlgorithmSource(e) => e.error_code(),
            _ => error_code::COMPILE_ERROR,
        }
    }
}
