use axum::{Json, extract::rejection::BytesRejection, http::StatusCode, response::IntoResponse};
use thiserror::Error;
use tracing::error;
use validator::{ValidationError, ValidationErrors};

use crate::{auth::AuthError, dao::storage::StorageError, dto::envelope::ErrorResponse};

/// Message returned with every 401.
pub const UNAUTHENTICATED_MESSAGE: &str = "User not authenticated";

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// The token authority could not be consulted.
    #[error("token verification unavailable: {0}")]
    Auth(#[from] AuthError),
    /// Caller could not be authenticated.
    #[error("User not authenticated")]
    Unauthorized,
    /// Invalid input provided by the client; the message is returned verbatim.
    #[error("{0}")]
    InvalidInput(String),
    /// Request body could not be read, e.g. it exceeds the size limit.
    #[error("failed to read request body: {0}")]
    UnreadableBody(#[from] BytesRejection),
    /// Request body is not valid JSON.
    #[error("malformed JSON body: {0}")]
    MalformedBody(#[source] serde_json::Error),
    /// A stored value could not be decoded.
    #[error("stored value for `{key}` is not valid: {source}")]
    CorruptRecord {
        /// Storage key being accessed.
        key: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// A record could not be encoded for storage.
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ServiceError {
    /// Client input error carrying the message of a failed field check.
    pub fn invalid(err: ValidationError, fallback: &str) -> Self {
        let message = err
            .message
            .map(|message| message.into_owned())
            .unwrap_or_else(|| fallback.to_owned());
        ServiceError::InvalidInput(message)
    }

    /// Client input error for a failed struct validation, reported with a fixed message.
    pub fn invalid_structure(err: &ValidationErrors, message: &str) -> Self {
        tracing::debug!(error = %err, "request body failed validation");
        ServiceError::InvalidInput(message.to_owned())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Missing or rejected bearer token.
    #[error("unauthorized")]
    Unauthorized,
    /// Any infrastructure failure; `error` is the fixed per-operation summary.
    #[error("{error}: {details}")]
    Internal {
        /// Fixed summary naming the failed operation.
        error: &'static str,
        /// Error detail string.
        details: String,
    },
}

impl AppError {
    /// Convert a service failure, naming the failed operation for internal errors.
    pub fn from_service(err: ServiceError, failure: &'static str) -> Self {
        match err {
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Unauthorized => AppError::Unauthorized,
            other => {
                error!(failure, error = %other, "request failed");
                AppError::Internal {
                    error: failure,
                    details: other.to_string(),
                }
            }
        }
    }

    /// Closure form of [`AppError::from_service`] for use with `map_err`.
    pub fn failed(failure: &'static str) -> impl FnOnce(ServiceError) -> AppError {
        move |err| AppError::from_service(err, failure)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error, details) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                UNAUTHENTICATED_MESSAGE.to_owned(),
                None,
            ),
            AppError::Internal { error, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error.to_owned(),
                Some(details),
            ),
        };

        let payload = Json(ErrorResponse {
            success: false,
            error,
            details,
        });

        (status, payload).into_response()
    }
}
