//! # tempora-core
//!
//! Foundation crate for the Tempora temporal abstraction engine.
//! Defines propositions, the interval/relation algebra, abstraction definitions,
//! collaborator traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod definitions;
pub mod errors;
pub mod proposition;
pub mod sources;
pub mod temporal;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::TemporaConfig;
pub use definitions::{AbstractionDefinition, PropositionDefinition};
pub use errors::{PartialResult, QueryError};
pub use proposition::{Proposition, PropositionKind, UniqueId, Value};
pub use traits::{Cancellable, CancellationToken};
pub use temporal::{Distance, GapFunction, Granularity, Interval, Relation, Side, TimeUnit};
