//! Process-local KV backend, used for development and tests.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{kv_store::KvStore, storage::StorageResult};

/// [`KvStore`] over a concurrent map; clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryKvStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a value without going through the async trait surface.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }
}

impl KvStore for MemoryKvStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: String) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let value = self.peek(&key);
        Box::pin(async move { Ok(value) })
    }

    fn put(&self, key: String, value: String) -> BoxFuture<'static, StorageResult<()>> {
        self.entries.insert(key, value);
        Box::pin(async { Ok(()) })
    }

    fn delete(&self, key: String) -> BoxFuture<'static, StorageResult<()>> {
        self.entries.remove(&key);
        Box::pin(async { Ok(()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_overwrites_previous_value() {
        let store = MemoryKvStore::new();
        store.put("k".into(), "one".into()).await.unwrap();
        store.put("k".into(), "two".into()).await.unwrap();

        assert_eq!(store.get("k".into()).await.unwrap().as_deref(), Some("two"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryKvStore::new();
        store.put("k".into(), "v".into()).await.unwrap();

        store.delete("k".into()).await.unwrap();
        store.delete("k".into()).await.unwrap();

        assert!(store.get("k".into()).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = MemoryKvStore::new();
        let other = store.clone();
        other.put("k".into(), "v".into()).await.unwrap();

        assert_eq!(store.peek("k").as_deref(), Some("v"));
    }
}
