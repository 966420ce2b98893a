/// CouchDB backend, one document per key.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-process backend.
pub mod memory;
/// MongoDB backend over a single `kv` collection.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

pub use memory::MemoryKvStore;

/// String-keyed, string-valued persistence shared by every route group.
///
/// Writes are total overwrites and deletes are idempotent; backends never
/// version records, so concurrent writers resolve as last-write-wins.
pub trait KvStore: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;
    /// Stored value, or `None` when the key does not exist.
    fn get(&self, key: String) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Replace whatever is stored under `key`.
    fn put(&self, key: String, value: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove `key`; succeeds when it is already absent.
    fn delete(&self, key: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap round trip proving the backend still answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Single attempt to restore the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
