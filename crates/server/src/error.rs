//! API error types.

use axum::Json;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use lfsgate_core::LFS_MEDIA_TYPE;
use serde::Serialize;

/// Challenge git-lfs looks for on 401 responses.
pub const LFS_AUTHENTICATE: HeaderName = HeaderName::from_static("lfs-authenticate");
const LFS_AUTHENTICATE_CHALLENGE: &str = "Basic realm=\"Git LFS\"";

/// API error response, in the shape git-lfs prints to the user.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("credentials needed")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid repository name: {0}")]
    InvalidRepositoryName(String),

    #[error("{0}")]
    UnprocessableBatch(String),

    #[error("unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),

    #[error("too many objects in batch: {count} (max {max})")]
    PayloadTooLarge { count: usize, max: usize },

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream timeout: {0}")]
    UpstreamTimeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidRepositoryName(_) => StatusCode::BAD_REQUEST,
            Self::UnprocessableBatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnsupportedHashAlgorithm(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<lfsgate_core::Error> for ApiError {
    fn from(err: lfsgate_core::Error) -> Self {
        use lfsgate_core::Error;
        match err {
            Error::InvalidRepositoryName(msg) => Self::InvalidRepositoryName(msg),
            Error::InvalidOid(msg) | Error::UnprocessableBatch(msg) => {
                Self::UnprocessableBatch(msg)
            }
            Error::UnsupportedHashAlgorithm(algo) => Self::UnsupportedHashAlgorithm(algo),
            Error::PayloadTooLarge { count, max } => Self::PayloadTooLarge { count, max },
        }
    }
}

impl From<lfsgate_identity::IdentityError> for ApiError {
    fn from(err: lfsgate_identity::IdentityError) -> Self {
        use lfsgate_identity::IdentityError;
        match err {
            IdentityError::Invalid => Self::Unauthenticated,
            IdentityError::Unavailable(msg) => Self::UpstreamUnavailable(msg),
            IdentityError::Config(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Upstream and internal details stay in the logs.
        let message = match &self {
            Self::UpstreamUnavailable(_) => "upstream service unavailable".to_string(),
            Self::UpstreamTimeout(_) => "upstream service timed out".to_string(),
            Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };

        let mut response = (status, Json(ErrorResponse { message })).into_response();
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(LFS_MEDIA_TYPE));
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(
                LFS_AUTHENTICATE,
                HeaderValue::from_static(LFS_AUTHENTICATE_CHALLENGE),
            );
        }
        response
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
