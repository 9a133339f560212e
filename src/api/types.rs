use std::sync::Arc;
use std::time::Instant;
use serde::{Serialize, Deserialize};

use crate::ca::{CertificateBackend, CertificateRecord, Representation};
use crate::telemetry::GatewayMetrics;

/// API state shared between handlers
#[derive(Clone)]
pub struct ApiState {
    /// Certificate backend
    pub backend: Arc<dyn CertificateBackend>,
    /// Metrics collector
    pub metrics: Arc<GatewayMetrics>,
    /// Process start, for uptime
    pub started_at: Instant,
    /// Wall-clock start time
    pub started_at_utc: chrono::DateTime<chrono::Utc>,
}

impl ApiState {
    pub fn new(backend: Arc<dyn CertificateBackend>, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            backend,
            metrics,
            started_at: Instant::now(),
            started_at_utc: chrono::Utc::now(),
        }
    }
}

/// Uniform error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub detail: String,
}

/// Error body of the list route, which always carries a certificate array
#[derive(Debug, Serialize, Deserialize)]
pub struct ListFailureBody {
    /// Human-readable message
    pub detail: String,
    /// Always empty
    pub certificates: Vec<CertificateRecord>,
}

/// Query of `GET /cert/{domain}`
#[derive(Debug, Default, Deserialize)]
pub struct FetchQuery {
    /// Requested representation, inline when absent
    #[serde(default)]
    pub format: Representation,
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_secs: u64,
    /// Start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}
