//! Tracing setup: structured logging for embedding applications and tests.

pub mod events;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use tempora_core::config::ObservabilityConfig;

static INIT: Once = Once::new();

/// Install a JSON subscriber filtered by `TEMPORA_LOG`, defaulting to `info`.
///
/// Idempotent. Does nothing when another global subscriber is already installed.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env("TEMPORA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .try_init();
    });
}

/// Install a subscriber with an explicit filter directive (for testing or embedding).
pub fn init_tracing_with_filter(filter: &str) {
    let filter = EnvFilter::new(filter);
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init();
    });
}

/// Install a subscriber from the `observability` config section.
pub fn init_from_config(config: &ObservabilityConfig) {
    let filter = EnvFilter::new(&config.log_level);
    let json = config.json;
    INIT.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true);
        let _ = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialisation_is_harmless() {
        init_from_config(&ObservabilityConfig::default());
        init_tracing();
        init_tracing_with_filter("debug");
        events::query_started("q", crate::ExecutionMode::Stateless, 1);
    }
}
