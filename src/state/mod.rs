use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::RwLock;
use tracing::info;

use crate::{auth::TokenVerifier, config::AppConfig, dao::kv_store::KvStore, error::ServiceError};

/// Handle to the state shared by every handler and background task.
pub type SharedState = Arc<AppState>;

/// Central application state: the injected KV store and token verifier.
pub struct AppState {
    kv_store: RwLock<Option<Arc<dyn KvStore>>>,
    verifier: Arc<dyn TokenVerifier>,
    config: AppConfig,
    degraded: AtomicBool,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, verifier: Arc<dyn TokenVerifier>) -> SharedState {
        Arc::new(Self {
            kv_store: RwLock::new(None),
            verifier,
            config,
            degraded: AtomicBool::new(true),
        })
    }

    /// Construct a state that is immediately served by `store`.
    pub fn with_store(
        config: AppConfig,
        store: Arc<dyn KvStore>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> SharedState {
        Arc::new(Self {
            kv_store: RwLock::new(Some(store)),
            verifier,
            config,
            degraded: AtomicBool::new(false),
        })
    }

    /// Obtain a handle to the current KV store, if one is installed.
    pub async fn kv_store(&self) -> Option<Arc<dyn KvStore>> {
        let guard = self.kv_store.read().await;
        guard.as_ref().cloned()
    }

    /// KV store for a request, or [`ServiceError::Degraded`] when none is usable.
    pub async fn require_kv_store(&self) -> Result<Arc<dyn KvStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.kv_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new KV store implementation and leave degraded mode.
    pub async fn install_kv_store(&self, store: Arc<dyn KvStore>) {
        {
            let mut guard = self.kv_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current KV store and enter degraded mode.
    pub async fn clear_kv_store(&self) {
        {
            let mut guard = self.kv_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Flip the degraded flag, logging transitions.
    pub fn update_degraded(&self, value: bool) {
        if self.degraded.swap(value, Ordering::AcqRel) != value {
            info!(degraded = value, "storage availability changed");
        }
    }

    /// Verifier consulted by the authenticated routes.
    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.verifier.as_ref()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
