use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias used throughout the MongoDB backend.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures raised by the MongoDB backend before they are folded into
/// [`StorageError`](crate::dao::storage::StorageError).
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI as configured.
        uri: String,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// The server did not answer the ping sent while connecting.
    #[error("MongoDB did not answer the connection ping")]
    ConnectPing {
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// The server did not answer a periodic health ping.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// A lookup failed.
    #[error("failed to read key `{key}`")]
    Read {
        /// Storage key being accessed.
        key: String,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// An upsert failed.
    #[error("failed to write key `{key}`")]
    Write {
        /// Storage key being accessed.
        key: String,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// A delete failed.
    #[error("failed to delete key `{key}`")]
    Delete {
        /// Storage key being accessed.
        key: String,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
}
