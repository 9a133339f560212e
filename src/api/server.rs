use std::net::{SocketAddr, TcpListener};
use axum::Router;
use tokio::signal;
use tracing::{info, error, debug};

use crate::error::Error;
use crate::config::Settings;
use crate::api::routes;
use crate::api::types::ApiState;
use crate::types::Result;

/// Gateway HTTP server
///
/// Owns the router and listening address and runs until a shutdown signal
/// arrives.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use certgate::api::{server::ApiServer, types::ApiState};
/// use certgate::ca::create_backend;
/// use certgate::config::Settings;
/// use certgate::telemetry::GatewayMetrics;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let settings = Settings::default();
///     let backend = create_backend(&settings.backend)?;
///     let state = ApiState::new(backend, Arc::new(GatewayMetrics::new()?));
///
///     let server = ApiServer::new(&settings, state)?;
///     server.start_with_shutdown().await?;
///
///     Ok(())
/// }
/// ```
pub struct ApiServer {
    /// Listening address
    address: SocketAddr,
    /// Router
    router: Router,
}

impl ApiServer {
    /// Create a new server from settings
    ///
    /// # Errors
    ///
    /// Returns an error if the listen address is invalid
    pub fn new(settings: &Settings, state: ApiState) -> Result<Self> {
        let address = settings.listen_address()?;
        let router = routes::create_router(state, settings);

        Ok(Self { address, router })
    }

    /// Start the server and wait for CTRL+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters an error while running
    pub async fn start_with_shutdown(self) -> Result<()> {
        info!("Starting certificate gateway on {}", self.address);

        let listener = TcpListener::bind(self.address)?;
        self.serve(listener, Self::shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        listener.set_nonblocking(true)?;

        let server = axum::Server::from_tcp(listener)?
            .serve(self.router.into_make_service())
            .with_graceful_shutdown(shutdown);

        if let Err(e) = server.await {
            error!("Gateway server error: {}", e);
            return Err(Error::ApiServerError(e.to_string()));
        }

        info!("Gateway shut down gracefully");
        Ok(())
    }

    /// Wait for shutdown signal
    async fn shutdown_signal() {
        let ctrl_c = async {
            match signal::ctrl_c().await {
                Ok(()) => debug!("Received Ctrl+C signal"),
                Err(e) => {
                    error!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    debug!("Received SIGTERM signal");
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        info!("Shutdown signal received, starting graceful shutdown");
    }

    /// Get the listening address
    pub fn address(&self) -> &SocketAddr {
        &self.address
    }

    /// Get the router
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
