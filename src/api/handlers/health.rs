use axum::{
    extract::State,
    Json,
};
use tracing::debug;

use crate::api::types::{ApiState, HealthResponse};

/// Health check handler
///
/// Reports process liveness only; the backend is not contacted.
///
/// # Route
///
/// `GET /health`
///
/// # Example Response
///
/// ```json
/// {
///   "status": "ok",
///   "version": "0.1.0",
///   "uptime_secs": 3600,
///   "started_at": "2024-05-01T08:00:00Z"
/// }
/// ```
pub async fn health_check(
    State(state): State<ApiState>,
) -> Json<HealthResponse> {
    debug!("Health check requested");

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        started_at: state.started_at_utc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;
    use std::sync::Arc;
    use crate::ca::provider::MockCertificateBackend;
    use crate::telemetry::GatewayMetrics;

    #[tokio::test]
    async fn test_health_check() {
        // No expectations: the backend must not be called
        let state = ApiState::new(
            Arc::new(MockCertificateBackend::new()),
            Arc::new(GatewayMetrics::new().unwrap()),
        );

        let app = Router::new()
            .route("/health", get(health_check))
            .with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(health.status, "ok");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }
}
