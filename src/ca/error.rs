use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Outcome of a failed backend call
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend has no certificate for the domain
    #[error("Certificate not found")]
    NotFound,

    /// Backend refused the request with a structured error body
    #[error("Backend rejected request with status {status}")]
    Rejected {
        /// Status returned by the backend
        status: StatusCode,
        /// JSON error body returned by the backend
        body: Value,
    },

    /// Backend did not answer within the bound
    #[error("Backend API timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Transport failure, unexpected status or unreadable response
    #[error("{0}")]
    Unavailable(String),
}

impl BackendError {
    /// Short outcome label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::NotFound => "not_found",
            BackendError::Rejected { .. } => "rejected",
            BackendError::Timeout(_) => "timeout",
            BackendError::Unavailable(_) => "unavailable",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout(_))
    }
}
