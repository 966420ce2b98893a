//! The `{success, ...}` wrappers every API response is serialized in.

use serde::Serialize;
use utoipa::ToSchema;

/// Successful read or write that returns a record, or `null` when none is stored.
#[derive(Debug, Serialize, ToSchema)]
pub struct DataResponse<T> {
    /// Always `true`.
    pub success: bool,
    /// Always serialized, `null` when the record does not exist.
    pub data: Option<T>,
    /// Informational message, e.g. when nothing is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> DataResponse<T> {
    /// Wrap a record without any message.
    pub fn found(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Successful lookup that found nothing.
    pub fn missing(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Record echoed back after a write.
    pub fn stored(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

/// Successful write or delete with nothing to return.
#[derive(Debug, Serialize, ToSchema)]
pub struct AckResponse {
    /// Always `true`.
    pub success: bool,
    /// What was done.
    pub message: String,
}

impl AckResponse {
    /// Successful acknowledgement carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Failure envelope for 400, 401 and 500 responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Human readable summary.
    pub error: String,
    /// Stringified cause, present on internal errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
