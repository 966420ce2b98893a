use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{kv_store::KvStore, storage::StorageError},
    state::SharedState,
};

/// Delays and limits driving the supervisor loop.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorPolicy {
    /// First pause after a failed connection or reconnect attempt.
    pub initial_delay: Duration,
    /// Upper bound of the doubling backoff.
    pub max_delay: Duration,
    /// Pause between health checks of a working store.
    pub health_poll_interval: Duration,
    /// In-place reconnects tried before the store is dropped and rebuilt from scratch.
    pub max_reconnect_attempts: u32,
}

impl Default for SupervisorPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(10),
            health_poll_interval: Duration::from_secs(5),
            max_reconnect_attempts: 3,
        }
    }
}

/// Connect to the KV backend and keep the shared state in degraded mode whenever it is unavailable.
///
/// Runs forever; spawn it on the runtime.
pub async fn run<F, Fut>(state: SharedState, policy: SupervisorPolicy, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn KvStore>, StorageError>> + Send,
{
    let mut delay = policy.initial_delay;

    loop {
        match connect().await {
            Ok(store) => {
                info!(
                    backend = store.backend(),
                    "storage connection established; leaving degraded mode"
                );
                state.install_kv_store(store.clone()).await;
                delay = policy.initial_delay;

                watch_store(&state, &policy, store.as_ref()).await;

                warn!("exhausted storage reconnect attempts; staying in degraded mode");
                state.clear_kv_store().await;
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = (delay * 2).min(policy.max_delay);
    }
}

/// Poll the installed store until it fails and cannot be reconnected.
async fn watch_store(state: &SharedState, policy: &SupervisorPolicy, store: &dyn KvStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
                sleep(policy.health_poll_interval).await;
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                if !reconnect(state, policy, store).await {
                    return;
                }
                state.update_degraded(false);
                sleep(policy.health_poll_interval).await;
            }
        }
    }
}

/// Try to revive `store` in place, entering degraded mode on the first failure.
async fn reconnect(state: &SharedState, policy: &SupervisorPolicy, store: &dyn KvStore) -> bool {
    let mut reconnect_delay = policy.initial_delay;

    for attempt in 0..policy.max_reconnect_attempts {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %err,
                        "storage reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay * 2).min(policy.max_delay);
            }
        }
    }

    false
}
