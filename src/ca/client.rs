use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::ca::error::BackendError;
use crate::ca::provider::CertificateBackend;
use crate::ca::types::{
    CertificateList, CertificateRecord, CertificateRequest, Operation, RawPayload, Representation,
};
use crate::config::BackendConfig;
use crate::error::Error;
use crate::types::Result;

/// HTTP client for the certificate backend
#[derive(Debug, Clone)]
pub struct HttpCertificateBackend {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the backend
    base_url: Url,
    /// Bound on listing
    list_timeout: Duration,
    /// Bound on issuance
    create_timeout: Duration,
    /// Bound on text fetches
    inline_timeout: Duration,
    /// Bound on zip fetches
    archive_timeout: Duration,
}

impl HttpCertificateBackend {
    /// Create a new backend client
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::HttpClient(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url()?,
            list_timeout: config.list_timeout(),
            create_timeout: config.create_timeout(),
            inline_timeout: config.inline_timeout(),
            archive_timeout: config.archive_timeout(),
        })
    }

    fn timeout_for(&self, operation: Operation) -> Duration {
        match operation {
            Operation::List => self.list_timeout,
            Operation::Create => self.create_timeout,
            Operation::FetchInline => self.inline_timeout,
            Operation::FetchArchive => self.archive_timeout,
        }
    }

    /// `{base}/cert` or `{base}/cert/{domain}`, with the domain encoded as one segment
    fn endpoint(&self, domain: Option<&str>) -> std::result::Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| BackendError::Unavailable("Invalid backend URL".to_string()))?;
            segments.pop_if_empty().push("cert");
            if let Some(domain) = domain {
                segments.push(domain);
            }
        }
        Ok(url)
    }

    /// Run one exchange (send and body read) under the operation's bound
    async fn bounded<T, F>(&self, operation: Operation, exchange: F) -> std::result::Result<T, BackendError>
    where
        F: Future<Output = std::result::Result<T, BackendError>>,
    {
        let bound = self.timeout_for(operation);

        match tokio::time::timeout(bound, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%operation, bound_ms = bound.as_millis() as u64, "Backend call timed out");
                Err(BackendError::Timeout(bound))
            }
        }
    }

    fn transport_error(&self, operation: Operation, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            return BackendError::Timeout(self.timeout_for(operation));
        }

        if err.is_decode() {
            warn!(%operation, error = %err, "Backend returned an unreadable response");
            return BackendError::Unavailable(operation.failure_message().to_string());
        }

        warn!(%operation, error = %err, "Backend request failed");
        BackendError::Unavailable("Backend API unavailable".to_string())
    }
}

#[async_trait]
impl CertificateBackend for HttpCertificateBackend {
    async fn list_certificates(&self) -> std::result::Result<CertificateList, BackendError> {
        let operation = Operation::List;
        let url = self.endpoint(None)?;
        debug!(%url, "Listing certificates");

        let request = self.client.get(url).header(ACCEPT, "application/json");

        self.bounded(operation, async move {
            let response = request
                .send()
                .await
                .map_err(|e| self.transport_error(operation, e))?;

            let status = response.status();
            if !status.is_success() {
                warn!(%operation, %status, "Backend returned an error status");
                return Err(BackendError::Unavailable(operation.failure_message().to_string()));
            }

            response
                .json::<CertificateList>()
                .await
                .map_err(|e| self.transport_error(operation, e))
        })
        .await
    }

    async fn create_certificate(
        &self,
        request: &CertificateRequest,
    ) -> std::result::Result<CertificateRecord, BackendError> {
        let operation = Operation::Create;
        let url = self.endpoint(None)?;
        debug!(%url, domain = %request.domain, alt_names = request.alt_names.len(), "Requesting certificate");

        let request = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(request);

        self.bounded(operation, async move {
            let response = request
                .send()
                .await
                .map_err(|e| self.transport_error(operation, e))?;

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<CertificateRecord>()
                    .await
                    .map_err(|e| self.transport_error(operation, e));
            }

            // Relay the backend's own error body and status
            let body = response
                .bytes()
                .await
                .map_err(|e| self.transport_error(operation, e))?;

            match serde_json::from_slice::<Value>(&body) {
                Ok(body) => Err(BackendError::Rejected { status, body }),
                Err(e) => {
                    warn!(%operation, %status, error = %e, "Backend error body is not JSON");
                    Err(BackendError::Unavailable(operation.failure_message().to_string()))
                }
            }
        })
        .await
    }

    async fn fetch_certificate(
        &self,
        domain: &str,
        representation: Representation,
    ) -> std::result::Result<RawPayload, BackendError> {
        let operation = representation.operation();
        let url = self.endpoint(Some(domain))?;
        debug!(%url, ?representation, "Fetching certificate");

        let request = self.client.get(url).header(ACCEPT, representation.accept());

        self.bounded(operation, async move {
            let response = request
                .send()
                .await
                .map_err(|e| self.transport_error(operation, e))?;

            match response.status() {
                status if status.is_success() => {}
                StatusCode::NOT_FOUND => return Err(BackendError::NotFound),
                status => {
                    warn!(%operation, %status, "Backend returned an error status");
                    return Err(BackendError::Unavailable(operation.failure_message().to_string()));
                }
            }

            let payload = match representation {
                Representation::Inline => response.bytes().await.map(RawPayload::Text),
                Representation::Archive => response.bytes().await.map(RawPayload::Archive),
            };

            payload.map_err(|e| self.transport_error(operation, e))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(base_url: &str) -> HttpCertificateBackend {
        let config = BackendConfig {
            base_url: base_url.to_string(),
            list_timeout_ms: 300,
            create_timeout_ms: 1_500,
            inline_timeout_ms: 300,
            archive_timeout_ms: 1_500,
        };
        HttpCertificateBackend::new(&config).unwrap()
    }

    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}", port)
    }

    #[test]
    fn test_endpoint_encodes_domain_as_one_segment() {
        let backend = backend_for("http://ca.internal:8000");
        assert_eq!(
            backend.endpoint(None).unwrap().as_str(),
            "http://ca.internal:8000/cert"
        );
        assert_eq!(
            backend.endpoint(Some("a.example.com")).unwrap().as_str(),
            "http://ca.internal:8000/cert/a.example.com"
        );
        assert_eq!(
            backend.endpoint(Some("a/../b c?x")).unwrap().as_str(),
            "http://ca.internal:8000/cert/a%2F..%2Fb%20c%3Fx"
        );

        let nested = backend_for("http://ca.internal:8000/v1/");
        assert_eq!(
            nested.endpoint(None).unwrap().as_str(),
            "http://ca.internal:8000/v1/cert"
        );
    }

    #[tokio::test]
    async fn test_list_relays_certificates() {
        let server = MockServer::start().await;
        let body = json!({
            "certificates": [
                {"domain": "a.example.com", "file": "a.example.com.crt"},
                {"domain": "b.example.com", "file": "b.example.com.crt"}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/cert"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let list = backend_for(&server.uri()).list_certificates().await.unwrap();

        assert_eq!(list.certificates.len(), 2);
        assert_eq!(list.certificates[1].domain(), Some("b.example.com"));
        assert_eq!(serde_json::to_value(&list).unwrap(), body);
    }

    #[tokio::test]
    async fn test_list_keeps_null_and_odd_entries() {
        let server = MockServer::start().await;
        let body = json!({
            "certificates": [
                {"domain": "a.example.com", "file": null},
                {"file": "b.example.com.crt"}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/cert"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let list = backend_for(&server.uri()).list_certificates().await.unwrap();

        assert_eq!(serde_json::to_value(&list).unwrap(), body);
    }

    #[tokio::test]
    async fn test_list_error_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cert"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = backend_for(&server.uri()).list_certificates().await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(ref msg) if msg == "Failed to fetch certificates"));
    }

    #[tokio::test]
    async fn test_list_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cert"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"certificates": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let started = Instant::now();
        let err = backend_for(&server.uri()).list_certificates().await.unwrap_err();

        assert!(matches!(err, BackendError::Timeout(bound) if bound == Duration::from_millis(300)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_list_connection_refused() {
        let err = backend_for(&closed_port_url())
            .list_certificates()
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Unavailable(_)));
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_create_forwards_request_body() {
        let server = MockServer::start().await;
        let request = CertificateRequest::new("a.example.com", vec!["*.a.example.com".to_string()]);

        Mock::given(method("POST"))
            .and(path("/cert"))
            .and(body_json(json!({"domain": "a.example.com", "alt_names": ["*.a.example.com"]})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"domain": "a.example.com", "file": "a.example.com.crt"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let record = backend_for(&server.uri())
            .create_certificate(&request)
            .await
            .unwrap();

        assert_eq!(record, CertificateRecord::new("a.example.com", "a.example.com.crt"));
    }

    #[tokio::test]
    async fn test_create_relays_any_success_body() {
        let server = MockServer::start().await;
        let body = json!({"message": "Certificate created successfully", "cert_path": "x.crt"});
        Mock::given(method("POST"))
            .and(path("/cert"))
            .respond_with(ResponseTemplate::new(201).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let record = backend_for(&server.uri())
            .create_certificate(&CertificateRequest::new("x.example.com", vec![]))
            .await
            .unwrap();

        assert_eq!(record.domain(), None);
        assert_eq!(serde_json::to_value(&record).unwrap(), body);
    }

    #[tokio::test]
    async fn test_create_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cert"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"domain": "a.example.com", "file": "a.example.com.crt"}))
                    .set_delay(Duration::from_secs(4)),
            )
            .mount(&server)
            .await;

        let started = Instant::now();
        let err = backend_for(&server.uri())
            .create_certificate(&CertificateRequest::new("a.example.com", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Timeout(bound) if bound == Duration::from_millis(1_500)));
        assert_eq!(err.to_string(), "Backend API timeout after 1500ms");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_create_relays_backend_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cert"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({"detail": "Certificate for this domain already exists."})),
            )
            .mount(&server)
            .await;

        let err = backend_for(&server.uri())
            .create_certificate(&CertificateRequest::new("a.example.com", vec![]))
            .await
            .unwrap_err();

        match err {
            BackendError::Rejected { status, body } => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(body, json!({"detail": "Certificate for this domain already exists."}));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_non_json_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cert"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = backend_for(&server.uri())
            .create_certificate(&CertificateRequest::new("a.example.com", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Unavailable(ref msg) if msg == "Failed to create certificate"));
    }

    #[tokio::test]
    async fn test_fetch_inline_preserves_text() {
        let server = MockServer::start().await;
        let pem = "-----BEGIN CERTIFICATE-----\nMIIBVzCB/qADAgECAhQd\r\nO9C416X0\n-----END CERTIFICATE-----\n";
        Mock::given(method("GET"))
            .and(path("/cert/a.example.com"))
            .and(header("accept", "text/plain"))
            .respond_with(ResponseTemplate::new(200).set_body_string(pem))
            .mount(&server)
            .await;

        let payload = backend_for(&server.uri())
            .fetch_certificate("a.example.com", Representation::Inline)
            .await
            .unwrap();

        assert_eq!(payload, RawPayload::Text(bytes::Bytes::from_static(pem.as_bytes())));
    }

    #[tokio::test]
    async fn test_fetch_inline_ignores_declared_charset() {
        let server = MockServer::start().await;
        let latin1: Vec<u8> = vec![0x63, 0xe9, 0x0a];
        Mock::given(method("GET"))
            .and(path("/cert/a.example.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(latin1.clone(), "text/plain; charset=iso-8859-1"),
            )
            .mount(&server)
            .await;

        let payload = backend_for(&server.uri())
            .fetch_certificate("a.example.com", Representation::Inline)
            .await
            .unwrap();

        assert_eq!(payload, RawPayload::Text(bytes::Bytes::from(latin1)));
    }

    #[tokio::test]
    async fn test_fetch_archive_preserves_bytes() {
        let server = MockServer::start().await;
        // Zip header followed by bytes that are not valid UTF-8
        let zip: Vec<u8> = vec![0x50, 0x4b, 0x03, 0x04, 0x14, 0x00, 0xff, 0xfe, 0x00, 0x80, 0xc3, 0x28];
        Mock::given(method("GET"))
            .and(path("/cert/a.example.com"))
            .and(header("accept", "application/zip"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(zip.clone())
                    .insert_header("content-type", "application/zip"),
            )
            .mount(&server)
            .await;

        let payload = backend_for(&server.uri())
            .fetch_certificate("a.example.com", Representation::Archive)
            .await
            .unwrap();

        match payload {
            RawPayload::Archive(bytes) => assert_eq!(bytes.as_ref(), zip.as_slice()),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cert/missing.example.com"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Certificate not found"})))
            .mount(&server)
            .await;

        let backend = backend_for(&server.uri());
        for representation in [Representation::Inline, Representation::Archive] {
            let err = backend
                .fetch_certificate("missing.example.com", representation)
                .await
                .unwrap_err();
            assert!(matches!(err, BackendError::NotFound));
        }
    }

    #[tokio::test]
    async fn test_fetch_other_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cert/a.example.com"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = backend_for(&server.uri())
            .fetch_certificate("a.example.com", Representation::Inline)
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Unavailable(ref msg) if msg == "Failed to fetch certificate"));
    }

    #[tokio::test]
    async fn test_fetch_uses_representation_bound() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cert/slow.example.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("pem")
                    .set_delay(Duration::from_millis(450)),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server.uri());

        // 450ms exceeds the inline bound but fits the archive bound
        let err = backend
            .fetch_certificate("slow.example.com", Representation::Inline)
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        let payload = backend
            .fetch_certificate("slow.example.com", Representation::Archive)
            .await
            .unwrap();
        assert_eq!(payload, RawPayload::Archive(bytes::Bytes::from_static(b"pem")));
    }
}
