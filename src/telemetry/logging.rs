use tracing::Level;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::TelemetryConfig;
use crate::error::Error;
use crate::types::Result;

/// Initialize the logging system
///
/// `RUST_LOG` wins over the configured level when it is set.
pub fn init_logging(config: &TelemetryConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(parse_level(&config.log_level).into()));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.structured_logging {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true))
            .try_init()
    };

    result.map_err(|e| Error::Internal(format!("Failed to set global default subscriber: {}", e)))
}

/// Parse log level, falling back to INFO
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
