use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::Error;
use crate::types::Result;

/// Prefix for environment overrides, e.g. `CERTGATE__BACKEND__BASE_URL`
const ENV_PREFIX: &str = "CERTGATE";

/// Shorthand override for the backend base URL
const BACKEND_URL_ENV: &str = "CERT_API_URL";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Certificate backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the gateway listens on
    pub listen_addr: String,

    /// Path prefix for the certificate routes ("" or e.g. "/api")
    pub path_prefix: String,

    /// Directory with a prebuilt UI bundle to serve at `/`
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            path_prefix: String::new(),
            static_dir: None,
        }
    }
}

/// Certificate backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the certificate service
    pub base_url: String,

    /// Bound on `GET /cert`
    pub list_timeout_ms: u64,

    /// Bound on `POST /cert`
    pub create_timeout_ms: u64,

    /// Bound on `GET /cert/{domain}` in text form
    pub inline_timeout_ms: u64,

    /// Bound on `GET /cert/{domain}` in zip form
    pub archive_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            list_timeout_ms: 5_000,
            create_timeout_ms: 10_000,
            inline_timeout_ms: 5_000,
            archive_timeout_ms: 10_000,
        }
    }
}

impl BackendConfig {
    /// Parsed base URL
    pub fn url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::Config(format!(
                    "Backend URL must use http or https, got {}",
                    other
                )))
            }
        }

        if url.cannot_be_a_base() {
            return Err(Error::Config(format!("Backend URL cannot be a base: {}", url)));
        }

        Ok(url)
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_millis(self.list_timeout_ms)
    }

    pub fn create_timeout(&self) -> Duration {
        Duration::from_millis(self.create_timeout_ms)
    }

    pub fn inline_timeout(&self) -> Duration {
        Duration::from_millis(self.inline_timeout_ms)
    }

    pub fn archive_timeout(&self) -> Duration {
        Duration::from_millis(self.archive_timeout_ms)
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level
    pub log_level: String,

    /// Emit JSON log lines
    pub structured_logging: bool,

    /// Expose `/metrics`
    pub enable_metrics: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            structured_logging: false,
            enable_metrics: true,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Settings {
    /// Load configuration from `.env`, configuration files and environment variables
    pub fn load() -> Result<Self> {
        use config::{Environment, File};

        // A missing .env file is the normal case outside development
        dotenvy::dotenv().ok();

        let mut builder = Self::builder_with_defaults()?;

        // Add configuration from files
        if let Ok(config_path) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_path));
        } else {
            builder = builder.add_source(File::with_name("config/default").required(false));

            let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
            builder = builder.add_source(File::with_name(&format!("config/{}", app_env)).required(false));
        }

        // Add environment variables
        builder = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_override_option("backend.base_url", env::var(BACKEND_URL_ENV).ok())?;

        Self::build(builder)
    }

    /// Load configuration from defaults and a single file, ignoring the environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let builder = Self::builder_with_defaults()?
            .add_source(config::File::from(path.as_ref()));

        Self::build(builder)
    }

    fn builder_with_defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder().add_source(config::Config::try_from(&Self::default())?))
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Get listen address
    pub fn listen_address(&self) -> Result<SocketAddr> {
        self.server
            .listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("Invalid listen address: {}", e)))
    }

    /// Check if configuration is valid
    pub fn validate(&self) -> Result<()> {
        self.listen_address()?;
        self.backend.url()?;

        let timeouts = [
            ("list", self.backend.list_timeout_ms),
            ("create", self.backend.create_timeout_ms),
            ("inline", self.backend.inline_timeout_ms),
            ("archive", self.backend.archive_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(Error::Config(format!("Backend {} timeout cannot be zero", name)));
            }
        }

        let prefix = &self.server.path_prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            return Err(Error::Config(format!(
                "Path prefix must start with '/' and not end with '/': {}",
                prefix
            )));
        }

        Ok(())
    }
}
