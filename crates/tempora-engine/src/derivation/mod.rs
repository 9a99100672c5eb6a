//! Derivation tracking: which propositions were derived from which.

pub mod graph;

pub use graph::{DerivationGraph, DerivationSnapshot};
