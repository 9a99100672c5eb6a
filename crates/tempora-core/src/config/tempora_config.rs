//! Top-level Tempora configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{EngineConfig, ObservabilityConfig, PipelineConfig, StorageConfig};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`TEMPORA_*`)
/// 2. TOML config file
/// 3. Compiled defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporaConfig {
    pub engine: EngineConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
}

impl TemporaConfig {
    /// Load configuration: defaults, then `path` when given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read_toml_file(path)?,
            None => Self::default(),
        };
        Self::apply_env_overrides(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &TemporaConfig) -> Result<(), ConfigError> {
        if config.engine.max_firings_per_key == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "engine.max_firings_per_key".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.pipeline.queue_capacity == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "pipeline.queue_capacity".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.pipeline.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "pipeline.poll_interval_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if !config.storage.in_memory && config.storage.directory.is_none() {
            return Err(ConfigError::ValidationFailed {
                field: "storage.directory".to_string(),
                message: "required when storage.in_memory is false".to_string(),
            });
        }
        if config.observability.log_level.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "observability.log_level".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn read_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Unparseable values are ignored and the lower layer wins.
    fn apply_env_overrides(config: &mut TemporaConfig) {
        if let Ok(val) = std::env::var("TEMPORA_QUEUE_CAPACITY") {
            if let Ok(v) = val.parse::<usize>() {
                config.pipeline.queue_capacity = v;
            }
        }
        if let Ok(val) = std::env::var("TEMPORA_MAX_FIRINGS") {
            if let Ok(v) = val.parse::<usize>() {
                config.engine.max_firings_per_key = v;
            }
        }
        if let Ok(val) = std::env::var("TEMPORA_STORAGE_DIR") {
            if !val.is_empty() {
                config.storage.directory = Some(PathBuf::from(val));
                config.storage.in_memory = false;
            }
        }
        if let Ok(val) = std::env::var("TEMPORA_LOG") {
            if !val.is_empty() {
                config.observability.log_level = val;
            }
        }
    }
}
