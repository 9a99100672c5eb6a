//! In-memory reference implementations of the collaborator traits.

pub mod algorithm;
pub mod data;
pub mod knowledge;

pub use algorithm::InMemoryAlgorithmSource;
pub use data::{InMemoryDataSource, VecEventIterator};
pub use knowledge::InMemoryKnowledgeSource;
