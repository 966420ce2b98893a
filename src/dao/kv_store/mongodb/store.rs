use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{Client, Collection, Database, bson::doc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};
use crate::dao::{kv_store::KvStore, storage::StorageResult};

const KV_COLLECTION_NAME: &str = "kv";

/// One KV entry; the key doubles as the primary key so lookups hit the `_id` index.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoValueDocument {
    #[serde(rename = "_id")]
    key: String,
    value: String,
}

/// Builds a client for the configured database and checks it answers a ping.
///
/// A single attempt: retries and backoff belong to the storage supervisor.
async fn open_database(config: &MongoConfig) -> MongoResult<Database> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);
    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|source| MongoDaoError::ConnectPing { source })?;
    Ok(database)
}

/// [`KvStore`] backed by the `kv` collection of a MongoDB database.
#[derive(Clone)]
pub struct MongoKvStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn collection(&self) -> Collection<MongoValueDocument> {
        self.database
            .read()
            .await
            .collection::<MongoValueDocument>(KV_COLLECTION_NAME)
    }

    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database = open_database(&self.config).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoKvStore {
    /// Open the configured database, failing when the server does not answer.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = open_database(&config).await?;

        Ok(Self {
            inner: Arc::new(MongoInner {
                database: RwLock::new(database),
                config,
            }),
        })
    }
}

impl KvStore for MongoKvStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    fn get(&self, key: String) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let found = inner
                .collection()
                .await
                .find_one(doc! { "_id": key.as_str() })
                .await
                .map_err(|source| MongoDaoError::Read {
                    key: key.clone(),
                    source,
                })?;
            Ok(found.map(|doc| doc.value))
        })
    }

    fn put(&self, key: String, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let document = MongoValueDocument {
                key: key.clone(),
                value,
            };
            inner
                .collection()
                .await
                .replace_one(doc! { "_id": key.as_str() }, &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Write {
                    key: key.clone(),
                    source,
                })?;
            Ok(())
        })
    }

    fn delete(&self, key: String) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner
                .collection()
                .await
                .delete_one(doc! { "_id": key.as_str() })
                .await
                .map_err(|source| MongoDaoError::Delete {
                    key: key.clone(),
                    source,
                })?;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.reconnect().await.map_err(Into::into) })
    }
}
