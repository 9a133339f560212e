//! certgate - HTTP gateway for a certificate management backend
//!
//! Relays certificate listing, issuance and download requests from a browser
//! UI to a certificate service, with bounded waits and uniform JSON errors.

// Foundational layer
pub mod error;
pub mod types;
pub mod config;
pub mod telemetry;

// Core layer
pub mod ca;

// Interface layer
pub mod api;

// Public key types
pub use crate::error::Error;
pub use crate::types::Result;
pub use crate::ca::{BackendError, CertificateBackend, Representation};
pub use crate::api::ApiServer;
pub use crate::telemetry::GatewayMetrics;
