pub mod settings;

pub use settings::{BackendConfig, ServerConfig, Settings, TelemetryConfig};
