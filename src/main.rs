use anyhow::{Context, Result};
use certgate::{
    api::{ApiServer, ApiState},
    ca::create_backend,
    config::Settings,
    telemetry::{self, GatewayMetrics},
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;

    // 2. Initialize telemetry
    telemetry::init_logging(&settings.telemetry)?;
    info!("Starting certgate...");
    info!(
        backend = %settings.backend.base_url,
        prefix = %settings.server.path_prefix,
        "Configuration loaded successfully"
    );

    // 3. Backend client and metrics
    let backend = create_backend(&settings.backend)?;
    let metrics = Arc::new(GatewayMetrics::new()?);

    // 4. Serve until shutdown
    let server = ApiServer::new(&settings, ApiState::new(backend, metrics))?;
    info!("certgate listening on {}", server.address());
    server.start_with_shutdown().await?;

    info!("certgate stopped successfully");
    Ok(())
}
