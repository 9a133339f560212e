use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::future::Future;
use std::time::Instant;
use tracing::debug;

use crate::api::errors::{ApiError, ApiResult, ListError};
use crate::api::types::{ApiState, FetchQuery};
use crate::ca::{
    BackendError, CertificateList, CertificateRecord, CertificateRequest, Operation, RawPayload,
};

/// List issued certificates
///
/// # Route
///
/// `GET /cert`
///
/// Relays the backend listing. On any failure the response is a 500 with
/// `{"detail": ..., "certificates": []}`.
pub async fn list_certificates(
    State(state): State<ApiState>,
) -> Result<Json<CertificateList>, ListError> {
    let list = observe(&state, Operation::List, state.backend.list_certificates()).await?;
    debug!(count = list.certificates.len(), "Listed certificates");
    Ok(Json(list))
}

/// Request a new certificate
///
/// # Route
///
/// `POST /cert` with `{"domain": "...", "alt_names": [...]}`
///
/// Answers 201 with the backend's record. Backend rejections keep their
/// status and body.
pub async fn create_certificate(
    State(state): State<ApiState>,
    payload: Result<Json<CertificateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CertificateRecord>)> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    if request.domain.trim().is_empty() {
        return Err(ApiError::InvalidRequest("domain is required".to_string()));
    }

    let record = observe(&state, Operation::Create, state.backend.create_certificate(&request)).await?;
    debug!(domain = record.domain().unwrap_or("-"), "Certificate created");

    Ok((StatusCode::CREATED, Json(record)))
}

/// Fetch one certificate
///
/// # Route
///
/// `GET /cert/{domain}?format=inline|archive`
///
/// `inline` (the default) answers `text/plain`; `archive` answers an
/// `application/zip` attachment named `{domain}.zip`.
pub async fn fetch_certificate(
    State(state): State<ApiState>,
    Path(domain): Path<String>,
    query: Result<Query<FetchQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query.map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    validate_domain(&domain)?;

    let representation = query.format;
    let payload = observe(
        &state,
        representation.operation(),
        state.backend.fetch_certificate(&domain, representation),
    )
    .await?;

    payload_response(&domain, payload)
}

/// Run a backend call and record its outcome
async fn observe<T, F>(state: &ApiState, operation: Operation, call: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    let started = Instant::now();
    let result = call.await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(err) => err.kind(),
    };
    state
        .metrics
        .record_backend_call(operation.as_str(), outcome, started.elapsed());

    result
}

fn validate_domain(domain: &str) -> ApiResult<()> {
    if domain.trim().is_empty() || domain == "." || domain == ".." {
        return Err(ApiError::InvalidRequest("domain is required".to_string()));
    }

    if domain.chars().any(char::is_control) {
        return Err(ApiError::InvalidRequest(
            "domain must not contain control characters".to_string(),
        ));
    }

    Ok(())
}

fn payload_response(domain: &str, payload: RawPayload) -> ApiResult<Response> {
    match payload {
        RawPayload::Text(bytes) => Ok((
            [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))],
            bytes,
        )
            .into_response()),
        RawPayload::Archive(bytes) => {
            let disposition = HeaderValue::from_bytes(format!("attachment; filename={}.zip", domain).as_bytes())
                .map_err(|_| ApiError::InvalidRequest("domain cannot be used as a file name".to_string()))?;

            Ok((
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response())
        }
    }
}
