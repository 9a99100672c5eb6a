//! Tests for the Tempora configuration system.

use std::sync::Mutex;

use tempora_core::config::TemporaConfig;
use tempora_core::errors::ConfigError;

/// Serializes tests that touch environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn clear_tempora_env_vars() {
    for key in [
        "TEMPORA_QUEUE_CAPACITY",
        "TEMPORA_MAX_FIRINGS",
        "TEMPORA_STORAGE_DIR",
        "TEMPORA_LOG",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_match_documented_values() {
    let config = TemporaConfig::default();
    assert_eq!(config.engine.max_firings_per_key, 100_000);
    assert_eq!(config.pipeline.queue_capacity, 1024);
    assert_eq!(config.pipeline.poll_interval_ms, 100);
    assert!(config.storage.in_memory);
    assert!(config.storage.directory.is_none());
    assert_eq!(config.observability.log_level, "info");
    assert!(config.observability.json);
}

#[test]
fn partial_toml_keeps_defaults_for_missing_fields() {
    let config = TemporaConfig::from_toml(
        r#"
[pipeline]
queue_capacity = 8
"#,
    )
    .unwrap();
    assert_eq!(config.pipeline.queue_capacity, 8);
    assert_eq!(config.pipeline.poll_interval_ms, 100);
    assert_eq!(config.engine.max_firings_per_key, 100_000);
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let err = TemporaConfig::from_toml("[pipeline\nqueue_capacity = ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn zero_queue_capacity_fails_validation() {
    let err = TemporaConfig::from_toml("[pipeline]\nqueue_capacity = 0\n").unwrap_err();
    match err {
        ConfigError::ValidationFailed { field, .. } => assert_eq!(field, "pipeline.queue_capacity"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn on_disk_storage_requires_directory() {
    let err = TemporaConfig::from_toml("[storage]\nin_memory = false\n").unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { .. }));
}

#[test]
fn env_overrides_file_values() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_tempora_env_vars();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tempora.toml");
    std::fs::write(
        &path,
        r#"
[engine]
max_firings_per_key = 50

[pipeline]
queue_capacity = 16
"#,
    )
    .unwrap();

    std::env::set_var("TEMPORA_QUEUE_CAPACITY", "4");
    std::env::set_var("TEMPORA_LOG", "tempora_engine=debug");
    let config = TemporaConfig::load(Some(&path)).unwrap();
    clear_tempora_env_vars();

    assert_eq!(config.engine.max_firings_per_key, 50);
    assert_eq!(config.pipeline.queue_capacity, 4);
    assert_eq!(config.observability.log_level, "tempora_engine=debug");
}

#[test]
fn storage_dir_env_switches_to_disk() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_tempora_env_vars();

    std::env::set_var("TEMPORA_STORAGE_DIR", "/tmp/tempora-state");
    let config = TemporaConfig::load(None).unwrap();
    clear_tempora_env_vars();

    assert!(!config.storage.in_memory);
    assert_eq!(
        config.storage.directory.as_deref(),
        Some(std::path::Path::new("/tmp/tempora-state"))
    );
}

#[test]
fn missing_file_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_tempora_env_vars();
    let err = TemporaConfig::load(Some(std::path::Path::new("/nonexistent/tempora.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}
