//! Configuration for Tempora.
//! TOML-based, layered: env > file > compiled defaults.

pub mod defaults;
pub mod engine_config;
pub mod observability_config;
pub mod pipeline_config;
pub mod storage_config;
pub mod tempora_config;

pub use engine_config::EngineConfig;
pub use observability_config::ObservabilityConfig;
pub use pipeline_config::PipelineConfig;
pub use storage_config::StorageConfig;
pub use tempora_config::TemporaConfig;
