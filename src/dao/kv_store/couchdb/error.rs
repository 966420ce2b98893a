//! Error types raised by the CouchDB KV backend.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`CouchDaoError`] failures.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures that can occur while interacting with CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// The configured server URL is unusable.
    #[error("invalid CouchDB base URL `{url}`: {reason}")]
    InvalidBaseUrl {
        /// URL as configured.
        url: String,
        /// Why the URL was rejected.
        reason: String,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB rejected a database creation request.
    #[error("failed to create CouchDB database `{database}`")]
    DatabaseCreate {
        /// Database name.
        database: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB returned an unexpected status code for a database operation.
    #[error("unexpected CouchDB database response status {status} for `{database}`")]
    DatabaseStatus {
        /// Database name.
        database: String,
        /// Status code returned by the server.
        status: StatusCode,
    },
    /// A request to a document endpoint could not be sent.
    #[error("failed to send CouchDB request for `{key}`")]
    RequestSend {
        /// Storage key being accessed.
        key: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB returned an unexpected status code for a document endpoint.
    #[error("unexpected CouchDB response status {status} for `{key}`")]
    RequestStatus {
        /// Storage key being accessed.
        key: String,
        /// Status code returned by the server.
        status: StatusCode,
    },
    /// Response payload could not be parsed into the KV document shape.
    #[error("failed to decode CouchDB document `{key}`")]
    DecodeResponse {
        /// Storage key being accessed.
        key: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// Every overwrite attempt lost the revision race.
    #[error("CouchDB kept reporting conflicts for `{key}` after {attempts} attempt(s)")]
    Conflict {
        /// Storage key being accessed.
        key: String,
        /// Attempts made before giving up.
        attempts: u32,
    },
}
