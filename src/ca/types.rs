use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Issued certificate as reported by the backend
///
/// Held as the backend's JSON so it is relayed exactly as received,
/// null fields and unexpected shapes included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateRecord(pub Value);

impl CertificateRecord {
    pub fn new(domain: impl Into<String>, file: impl Into<String>) -> Self {
        Self(json!({ "domain": domain.into(), "file": file.into() }))
    }

    /// `domain` field, when the backend sent one as a string
    pub fn domain(&self) -> Option<&str> {
        self.0.get("domain").and_then(Value::as_str)
    }

    pub fn file(&self) -> Option<&str> {
        self.0.get("file").and_then(Value::as_str)
    }
}

/// Certificate listing
///
/// Only `certificates` being an array is required; its entries are opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateList {
    /// Issued certificates in backend order
    pub certificates: Vec<CertificateRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request for a new domain certificate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateRequest {
    /// Primary domain (Common Name)
    pub domain: String,
    /// Subject alternative names, in submission order
    #[serde(default)]
    pub alt_names: Vec<String>,
    /// Unrecognised fields, forwarded as sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CertificateRequest {
    pub fn new(domain: impl Into<String>, alt_names: Vec<String>) -> Self {
        Self {
            domain: domain.into(),
            alt_names,
            extra: Map::new(),
        }
    }
}

/// Response shape requested from a single-certificate fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    /// Certificate text for in-browser preview
    #[default]
    Inline,
    /// Zip bundle for download
    Archive,
}

impl Representation {
    /// `Accept` header sent to the backend
    pub fn accept(&self) -> &'static str {
        match self {
            Representation::Inline => "text/plain",
            Representation::Archive => "application/zip",
        }
    }

    /// Operation label for this representation
    pub fn operation(&self) -> Operation {
        match self {
            Representation::Inline => Operation::FetchInline,
            Representation::Archive => Operation::FetchArchive,
        }
    }
}

/// Single certificate payload
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Certificate text, byte for byte as the backend sent it
    Text(Bytes),
    /// Opaque zip bytes, never decoded
    Archive(Bytes),
}

/// Backend operation, used for logging and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    FetchInline,
    FetchArchive,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Create => "create",
            Operation::FetchInline => "fetch_inline",
            Operation::FetchArchive => "fetch_archive",
        }
    }

    /// Generic message for a failed call
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::List => "Failed to fetch certificates",
            Operation::Create => "Failed to create certificate",
            Operation::FetchInline | Operation::FetchArchive => "Failed to fetch certificate",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
