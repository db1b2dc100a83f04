//! Telemetry initialization
//!
//! Installs the global tracing subscriber. Inside the function runtime logs go
//! to stdout as JSON lines; locally the human-readable format is nicer.

use pixelhook_core::TelemetryConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing. `RUST_LOG` overrides the configured default filter.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let json_layer = config
        .json
        .then(|| fmt::layer().json().flatten_event(true).with_current_span(true));
    let text_layer = (!config.json).then(|| fmt::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::debug!(json = config.json, "Tracing initialized");
    Ok(())
}
