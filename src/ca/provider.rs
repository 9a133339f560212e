use async_trait::async_trait;
use std::sync::Arc;

use crate::ca::client::HttpCertificateBackend;
use crate::ca::error::BackendError;
use crate::ca::types::{CertificateList, CertificateRecord, CertificateRequest, RawPayload, Representation};
use crate::config::BackendConfig;
use crate::types::Result;

/// Certificate backend interface
///
/// Every call is a single bounded exchange with the backend. Implementations
/// hold no per-request state and are shared across all handlers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateBackend: Send + Sync {
    /// List issued certificates
    async fn list_certificates(&self) -> std::result::Result<CertificateList, BackendError>;

    /// Request a new certificate
    async fn create_certificate(
        &self,
        request: &CertificateRequest,
    ) -> std::result::Result<CertificateRecord, BackendError>;

    /// Fetch one certificate in the given representation
    async fn fetch_certificate(
        &self,
        domain: &str,
        representation: Representation,
    ) -> std::result::Result<RawPayload, BackendError>;
}

/// Create the certificate backend from configuration
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn CertificateBackend>> {
    let backend = HttpCertificateBackend::new(config)?;
    Ok(Arc::new(backend))
}
