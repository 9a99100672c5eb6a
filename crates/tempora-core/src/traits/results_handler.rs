//! The destination of query results.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::ResultHandlerError;
use crate::proposition::{Proposition, UniqueId};

/// Derivation edges keyed by the anchoring proposition's unique id.
pub type DerivationMap = BTreeMap<UniqueId, Vec<Arc<Proposition>>>;

/// Every live or delete-stamped proposition of a key by unique id.
pub type ReferenceIndex = BTreeMap<UniqueId, Arc<Proposition>>;

/// Receives one result per key, in delivery order, on the consumer thread.
pub trait QueryResultsHandler: Send {
    fn start(&mut self) -> Result<(), ResultHandlerError> {
        Ok(())
    }

    fn handle_query_result(
        &mut self,
        key_id: &str,
        propositions: &[Arc<Proposition>],
        forward: &DerivationMap,
        backward: &DerivationMap,
        references: &ReferenceIndex,
    ) -> Result<(), ResultHandlerError>;

    /// Called before `handle_query_result` when the key has deletions.
    fn handle_deletes(
        &mut self,
        _key_id: &str,
        _deleted: &[Arc<Proposition>],
    ) -> Result<(), ResultHandlerError> {
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ResultHandlerError> {
        Ok(())
    }
}
