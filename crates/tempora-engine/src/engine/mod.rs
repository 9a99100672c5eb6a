//! Forward-chaining execution of compiled rules, one key at a time.

pub mod agenda;
pub mod evaluate;
pub mod result;
pub mod session;
pub mod stateful;
pub mod stateless;
pub mod working_memory;

use tempora_core::errors::ExecutionError;
use tempora_core::proposition::Proposition;

pub use agenda::{Agenda, DesiredOutput};
pub use result::KeyResult;
pub use session::{Counters, ExecutionSession, SessionSnapshot};
pub use stateful::{StatefulExecution, StatefulStores};
pub use stateless::StatelessExecution;
pub use working_memory::WorkingMemory;

/// How working state is handled between keys.
pub trait ExecutionStrategy: Send {
    /// Run `propositions` for `key_id` to a fixpoint and read the output.
    fn execute(
        &mut self,
        key_id: &str,
        propositions: Vec<Proposition>,
    ) -> Result<KeyResult, ExecutionError>;

    /// Keys with persisted state, ascending. Empty for strategies that keep none.
    fn persisted_keys(&self) -> Result<Vec<String>, ExecutionError> {
        Ok(Vec::new())
    }

    /// Recompute a persisted key from its stored facts. `None` when the key has no state.
    fn reprocess(&mut self, _key_id: &str) -> Result<Option<KeyResult>, ExecutionError> {
        Ok(None)
    }
}
