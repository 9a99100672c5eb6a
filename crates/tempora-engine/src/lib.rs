//! # tempora-engine
//!
//! Turns abstraction definitions into rules and runs them to a fixpoint per key.
//! Compilation resolves and orders definitions, the session evaluates rules with a
//! dirty-set work list, and the strategies decide whether working state survives the key.

pub mod algorithms;
pub mod compiler;
pub mod derivation;
pub mod engine;

pub use algorithms::builtin_algorithm_source;
pub use compiler::{AbstractionCompiler, CompiledRuleSet};
pub use derivation::{DerivationGraph, DerivationSnapshot};
pub use engine::{
    ExecutionSession, ExecutionStrategy, KeyResult, SessionSnapshot, StatefulExecution,
    StatefulStores, StatelessExecution,
};
