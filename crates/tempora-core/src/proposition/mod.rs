//! Propositions: time-stamped or atemporal facts about a key.

pub mod base;
pub mod unique_id;
pub mod value;

pub use base::{Proposition, PropositionKind, Provenance};
pub use unique_id::UniqueId;
pub use value::Value;
