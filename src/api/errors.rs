use axum::{response::{IntoResponse, Response}, http::StatusCode, Json};
use tracing::{error, info, warn};

use crate::api::types::{ErrorBody, ListFailureBody};
use crate::ca::BackendError;

/// Error returned by the certificate routes
///
/// Every variant becomes a JSON object with a `detail` string, except a
/// backend rejection, whose body and status are relayed unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::InvalidRequest(msg) => {
                info!(detail = %msg, "Rejected invalid request");
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Backend(BackendError::Rejected { status, body }) => {
                warn!(%status, "Relaying backend rejection");
                return (status, Json(body)).into_response();
            }
            ApiError::Backend(err @ BackendError::NotFound) => {
                info!("Certificate not found");
                (StatusCode::NOT_FOUND, err.to_string())
            }
            ApiError::Backend(err) => {
                error!(kind = err.kind(), detail = %err, "Backend call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// Failure of the list route
///
/// Always a 500 with an empty `certificates` array next to `detail`; the
/// status, not the empty array, tells callers the listing failed.
#[derive(Debug)]
pub struct ListError(pub BackendError);

impl From<BackendError> for ListError {
    fn from(err: BackendError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        error!(kind = self.0.kind(), detail = %self.0, "Listing certificates failed");

        let body = ListFailureBody {
            detail: self.0.to_string(),
            certificates: Vec::new(),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
