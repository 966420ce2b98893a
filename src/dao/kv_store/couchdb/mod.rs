mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchKvStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::Conflict { key, attempts } => {
                StorageError::WriteConflict { key, attempts }
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
