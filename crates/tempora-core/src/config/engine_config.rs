use serde::{Deserialize, Serialize};

use super::defaults;

/// Inference engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on rule firings for a single key before execution aborts.
    pub max_firings_per_key: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_firings_per_key: defaults::DEFAULT_MAX_FIRINGS_PER_KEY,
        }
    }
}
