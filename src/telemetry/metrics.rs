use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

use crate::types::Result;

/// Backend call metrics for the gateway
pub struct GatewayMetrics {
    /// Registry
    registry: Registry,
    /// Backend calls by operation and outcome
    backend_requests: IntCounterVec,
    /// Backend call latency by operation
    backend_duration: HistogramVec,
}

impl GatewayMetrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let backend_requests = IntCounterVec::new(
            Opts::new(
                "certgate_backend_requests_total",
                "Backend certificate calls by operation and outcome",
            ),
            &["operation", "outcome"],
        )?;

        let backend_duration = HistogramVec::new(
            HistogramOpts::new(
                "certgate_backend_request_duration_seconds",
                "Backend certificate call latency",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["operation"],
        )?;

        registry.register(Box::new(backend_requests.clone()))?;
        registry.register(Box::new(backend_duration.clone()))?;

        Ok(Self {
            registry,
            backend_requests,
            backend_duration,
        })
    }

    /// Record one finished backend call
    pub fn record_backend_call(&self, operation: &str, outcome: &str, elapsed: Duration) {
        self.backend_requests
            .with_label_values(&[operation, outcome])
            .inc();
        self.backend_duration
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    /// Number of recorded calls for a label pair
    pub fn backend_call_count(&self, operation: &str, outcome: &str) -> u64 {
        self.backend_requests
            .with_label_values(&[operation, outcome])
            .get()
    }

    /// Render the registry in Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| crate::error::Error::Metrics(format!("Non UTF-8 metrics output: {}", e)))
    }
}
