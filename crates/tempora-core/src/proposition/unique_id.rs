use serde::{Deserialize, Serialize};

use crate::constants::DERIVED_SOURCE_ID;

/// Identity of a proposition: the system it came from plus its id there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniqueId {
    pub source_id: String,
    pub local_id: String,
}

impl UniqueId {
    pub fn new(source_id: impl Into<String>, local_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            local_id: local_id.into(),
        }
    }

    /// Identity of the `sequence`-th proposition derived for `proposition_id`.
    pub fn derived(proposition_id: &str, sequence: u64) -> Self {
        Self::new(DERIVED_SOURCE_ID, format!("{proposition_id}#{sequence}"))
    }

    pub fn is_derived(&self) -> bool {
        self.source_id == DERIVED_SOURCE_ID
    }
}

impl std::fmt::Display for UniqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.source_id, self.local_id)
    }
}
