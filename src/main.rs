//! player-kv-back binary entrypoint wiring configuration, KV backend, token authority and HTTP routes.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use player_kv_back::{
    auth::{HttpTokenVerifier, HttpVerifierConfig, RejectAllVerifier, TokenVerifier},
    config::{AppConfig, AuthSettings, StorageSettings},
    dao::kv_store::MemoryKvStore,
    routes,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    let verifier = build_verifier(config.auth())?;
    let app_state = AppState::new(config.clone(), verifier);

    start_storage(&app_state, config.storage()).await?;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the token authority; without one every bearer token is rejected.
fn build_verifier(settings: Option<&AuthSettings>) -> anyhow::Result<Arc<dyn TokenVerifier>> {
    let Some(settings) = settings else {
        warn!("AUTH_VERIFY_URL not set; authenticated routes will reject every token");
        return Ok(Arc::new(RejectAllVerifier));
    };

    let verify_url = settings
        .verify_url
        .parse()
        .with_context(|| format!("parsing AUTH_VERIFY_URL `{}`", settings.verify_url))?;
    let verifier = HttpTokenVerifier::new(HttpVerifierConfig {
        verify_url,
        api_key: settings.api_key.clone(),
    })
    .context("building token verifier")?;
    info!(url = %settings.verify_url, "verifying bearer tokens against external authority");
    Ok(Arc::new(verifier))
}

/// Install the in-memory store directly, or hand remote backends to the storage supervisor.
async fn start_storage(state: &SharedState, settings: &StorageSettings) -> anyhow::Result<()> {
    use player_kv_back::services::storage_supervisor::{self, SupervisorPolicy};

    match settings.clone() {
        StorageSettings::Memory => {
            warn!("using in-memory KV store; data is lost on restart");
            state.install_kv_store(Arc::new(MemoryKvStore::new())).await;
        }
        #[cfg(feature = "couch-store")]
        StorageSettings::CouchDb {
            base_url,
            database,
            credentials,
        } => {
            use player_kv_back::dao::{
                kv_store::{
                    KvStore,
                    couchdb::{CouchConfig, CouchKvStore},
                },
                storage::StorageError,
            };

            let mut config = CouchConfig::new(&base_url, database).context("configuring CouchDB")?;
            if let Some((username, password)) = credentials {
                config = config.with_credentials(username, password);
            }
            tokio::spawn(storage_supervisor::run(
                state.clone(),
                SupervisorPolicy::default(),
                move || {
                    let config = config.clone();
                    async move {
                        let store = CouchKvStore::connect(config).await?;
                        Ok::<_, StorageError>(Arc::new(store) as Arc<dyn KvStore>)
                    }
                },
            ));
        }
        #[cfg(feature = "mongo-store")]
        StorageSettings::MongoDb { uri, database } => {
            use player_kv_back::dao::{
                kv_store::{
                    KvStore,
                    mongodb::{MongoConfig, MongoKvStore},
                },
                storage::StorageError,
            };

            let config = MongoConfig::from_uri(&uri, database.as_deref())
                .await
                .context("configuring MongoDB")?;
            tokio::spawn(storage_supervisor::run(
                state.clone(),
                SupervisorPolicy::default(),
                move || {
                    let config = config.clone();
                    async move {
                        let store = MongoKvStore::connect(config).await?;
                        Ok::<_, StorageError>(Arc::new(store) as Arc<dyn KvStore>)
                    }
                },
            ));
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("KV backend {other:?} is not compiled into this binary"),
    }

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
