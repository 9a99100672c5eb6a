//! Compiled defaults for every config section.

pub const DEFAULT_MAX_FIRINGS_PER_KEY: usize = 100_000;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

pub const DEFAULT_STORAGE_IN_MEMORY: bool = true;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_JSON: bool = true;
