//! Log output setup
//!
//! `RUST_LOG` wins over the configured level when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mapstore_core::config::LoggingConfig;

/// Error raised while installing the global subscriber.
pub type TelemetryError = Box<dyn std::error::Error + Send + Sync>;

/// Builds the level filter from `RUST_LOG`, falling back to `config.level`.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.level)?),
    }
}

/// Installs the global `tracing` subscriber. Call once, before serving.
pub fn init_telemetry(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let json_layer = config.json.then(|| fmt::layer().json().with_current_span(true));
    let text_layer = (!config.json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(env_filter(config)?)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;

    tracing::info!(level = %config.level, json = config.json, "logging initialized");
    Ok(())
}
