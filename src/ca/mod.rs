pub mod client;
pub mod error;
pub mod provider;
pub mod types;

// Re-export key types
pub use client::HttpCertificateBackend;
pub use error::BackendError;
pub use provider::{create_backend, CertificateBackend};
pub use types::{
    CertificateList, CertificateRecord, CertificateRequest, Operation, RawPayload, Representation,
};
