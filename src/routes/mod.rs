use axum::Router;

use crate::state::SharedState;

/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Liveness endpoint.
pub mod health;
/// Anonymous player state endpoints.
pub mod player_state;
/// Authenticated save data endpoints.
pub mod save;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(player_state::router())
        .merge(save::router());

    api_router.merge(docs::router()).with_state(state)
}
