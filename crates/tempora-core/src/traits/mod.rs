//! Interfaces to the collaborators around the engine.

pub mod algorithm;
pub mod cancellation;
pub mod data_source;
pub mod knowledge_source;
pub mod results_handler;
pub mod store;

pub use algorithm::{Algorithm, AlgorithmParameter, AlgorithmSource};
pub use cancellation::{Cancellable, CancellationToken};
pub use data_source::{
    DataRequest, DataSource, DataStreamingEvent, DataStreamingEventIterator, Filter,
};
pub use knowledge_source::KnowledgeSource;
pub use results_handler::{DerivationMap, QueryResultsHandler, ReferenceIndex};
pub use store::KeyValueStore;
