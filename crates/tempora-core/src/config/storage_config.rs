use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Where stateful execution keeps per-key working state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for SQLite store files. Required when `in_memory` is false.
    pub directory: Option<PathBuf>,
    /// Keep stores in memory instead of on disk. In-memory stores live for one query only,
    /// so stateful queries carry nothing over to the next query. This is the default.
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: None,
            in_memory: defaults::DEFAULT_STORAGE_IN_MEMORY,
        }
    }
}
