use axum::Router;
use axum::routing::get;
use axum::middleware;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Settings;
use crate::api::types::ApiState;
use crate::api::middlewares::{logging_middleware, request_id_middleware};
use crate::api::handlers::{
    certs::{create_certificate, fetch_certificate, list_certificates},
    health::health_check,
    metrics::get_metrics,
};

/// Create router with all API routes
///
/// Certificate routes live under `server.path_prefix`; `/health` and
/// `/metrics` are always at the root. When `server.static_dir` is set,
/// unmatched paths are served from that directory.
pub fn create_router(state: ApiState, settings: &Settings) -> Router {
    let prefix = settings.server.path_prefix.as_str();

    // Define certificate routes
    let cert_routes = Router::new()
        .route("/cert", get(list_certificates).post(create_certificate))
        .route("/cert/:domain", get(fetch_certificate));

    // Define operational routes
    let mut router = Router::new().route("/health", get(health_check));
    if settings.telemetry.enable_metrics {
        router = router.route("/metrics", get(get_metrics));
    }

    router = if prefix.is_empty() {
        router.merge(cert_routes)
    } else {
        router.nest(prefix, cert_routes)
    };

    if let Some(dir) = &settings.server.static_dir {
        info!("Serving static UI from {}", dir.display());
        router = router.fallback_service(ServeDir::new(dir));
    }

    // Global middleware stack
    let middleware_stack = ServiceBuilder::new()
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http());

    router.layer(middleware_stack).with_state(state)
}
