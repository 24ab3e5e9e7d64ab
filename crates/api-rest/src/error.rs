//! Mapping from failures to HTTP responses.

use api_shared::{AuthError, ErrorRes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use contacts_core::{ContactError, ValidationErrors};

const NOT_FOUND: &str = "Not found.";

/// Every way a contacts request can fail.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Payload failed the schema. `400` with field-level detail.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    /// Body was not parseable JSON. `400`.
    #[error("JSON parse error - {0}")]
    MalformedBody(String),
    /// Query parameters were unusable. `400` with field-level detail.
    #[error("invalid query parameters: {0}")]
    InvalidQuery(ValidationErrors),
    /// Identifier does not resolve. `404`.
    #[error("not found")]
    NotFound,
    /// No credentials on a write. `401`.
    #[error("unauthorized: {0}")]
    Unauthorized(AuthError),
    /// Credentials present but not sufficient. `403`.
    #[error("forbidden: {0}")]
    Forbidden(AuthError),
    /// Storage or serialization failure. `500`, logged.
    #[error("internal error: {0}")]
    Internal(ContactError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized(err),
            AuthError::InvalidCredentials | AuthError::WritesDisabled => ApiError::Forbidden(err),
        }
    }
}

impl From<ContactError> for ApiError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::NotFound(_) => ApiError::NotFound,
            other => ApiError::Internal(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody(_) | ApiError::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(errors) | ApiError::InvalidQuery(errors) => {
                (status, Json(errors)).into_response()
            }
            ApiError::MalformedBody(message) => (
                status,
                Json(ErrorRes::new(format!("JSON parse error - {message}"))),
            )
                .into_response(),
            ApiError::NotFound => (status, Json(ErrorRes::new(NOT_FOUND))).into_response(),
            ApiError::Unauthorized(err) => {
                let mut response = (status, Json(ErrorRes::new(err.to_string()))).into_response();
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("ApiKey header=\"x-api-key\""),
                );
                response
            }
            ApiError::Forbidden(err) => {
                (status, Json(ErrorRes::new(err.to_string()))).into_response()
            }
            ApiError::Internal(err) => {
                tracing::error!("contacts request failed: {:?}", err);
                (status, Json(ErrorRes::new("Internal error"))).into_response()
            }
        }
    }
}
