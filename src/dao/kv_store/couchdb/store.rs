use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::dao::{kv_store::KvStore, storage::StorageResult};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchRevision, CouchValueDocument},
};

/// Revision races tolerated before an overwrite or delete gives up.
const MAX_WRITE_ATTEMPTS: u32 = 5;

/// [`KvStore`] backed by a CouchDB database over its HTTP API.
#[derive(Clone)]
pub struct CouchKvStore {
    client: Client,
    base_url: Arc<Url>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchKvStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let auth = config
            .credentials
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url: Arc::new(config.base_url),
            database: Arc::from(config.database),
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    /// URL of the database, or of a document inside it when `doc_id` is set.
    ///
    /// Segments are percent-encoded so user-controlled ids cannot escape the database path.
    fn url(&self, doc_id: Option<&str>) -> Url {
        let mut url = Url::clone(&self.base_url);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.database);
            if let Some(id) = doc_id {
                segments.push(id);
            }
        }
        url
    }

    fn request(&self, method: Method, doc_id: Option<&str>) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(doc_id));
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let response = self
            .request(Method::GET, None)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                key: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .request(Method::PUT, None)
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                // 412 means another instance created it in the meantime.
                if create.status().is_success() || create.status() == StatusCode::PRECONDITION_FAILED
                {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, key: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, Some(key))
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                key: key.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        key: key.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                key: key.to_string(),
                status: other,
            }),
        }
    }

    async fn current_rev(&self, key: &str) -> CouchResult<Option<String>> {
        let doc = self.get_document::<CouchRevision>(key).await?;
        Ok(doc.map(|doc| doc.rev))
    }

    async fn write_value(&self, key: &str, value: String) -> CouchResult<()> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let doc = CouchValueDocument {
                id: key.to_owned(),
                rev: self.current_rev(key).await?,
                value: value.clone(),
            };

            let response = self
                .request(Method::PUT, Some(key))
                .json(&doc)
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    key: key.to_string(),
                    source,
                })?;

            match response.status() {
                status if status.is_success() => return Ok(()),
                StatusCode::CONFLICT => {
                    debug!(key, attempt, "CouchDB revision conflict on write; retrying");
                }
                other => {
                    return Err(CouchDaoError::RequestStatus {
                        key: key.to_string(),
                        status: other,
                    });
                }
            }
        }

        Err(CouchDaoError::Conflict {
            key: key.to_string(),
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }

    async fn remove_value(&self, key: &str) -> CouchResult<()> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Some(rev) = self.current_rev(key).await? else {
                return Ok(());
            };

            let response = self
                .request(Method::DELETE, Some(key))
                .query(&[("rev", rev)])
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    key: key.to_string(),
                    source,
                })?;

            match response.status() {
                status if status.is_success() => return Ok(()),
                StatusCode::NOT_FOUND => return Ok(()),
                StatusCode::CONFLICT => {
                    debug!(key, attempt, "CouchDB revision conflict on delete; retrying");
                }
                other => {
                    return Err(CouchDaoError::RequestStatus {
                        key: key.to_string(),
                        status: other,
                    });
                }
            }
        }

        Err(CouchDaoError::Conflict {
            key: key.to_string(),
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }
}

impl KvStore for CouchKvStore {
    fn backend(&self) -> &'static str {
        "couchdb"
    }

    fn get(&self, key: String) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc = store.get_document::<CouchValueDocument>(&key).await?;
            Ok(doc.map(|doc| doc.value))
        })
    }

    fn put(&self, key: String, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.write_value(&key, value).await.map_err(Into::into) })
    }

    fn delete(&self, key: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.remove_value(&key).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let database = store.database.to_string();
            let response = store
                .request(Method::GET, None)
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    key: database.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::DatabaseStatus {
                    database,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
