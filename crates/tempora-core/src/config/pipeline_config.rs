use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Producer/consumer pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of the bounded result queue.
    pub queue_capacity: usize,
    /// How often a blocked consumer re-checks cancellation (milliseconds).
    pub poll_interval_ms: u64,
}

impl PipelineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: defaults::DEFAULT_QUEUE_CAPACITY,
            poll_interval_ms: defaults::DEFAULT_POLL_INTERVAL_MS,
        }
    }
}
