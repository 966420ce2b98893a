use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping the installed KV store and report whether requests can be served.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let Some(store) = state.kv_store().await else {
        warn!("storage unavailable (degraded mode)");
        return HealthResponse::degraded();
    };

    if let Err(err) = store.health_check().await {
        warn!(error = %err, backend = store.backend(), "storage health check failed");
        return HealthResponse::degraded();
    }

    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok(store.backend())
    }
}
