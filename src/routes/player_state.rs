use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::BytesRejection},
    routing::get,
};

use crate::{
    dto::{
        envelope::{AckResponse, DataResponse, ErrorResponse},
        player_state::{PlayerState, SavePlayerStateRequest, UserQuery},
    },
    error::AppError,
    services::player_state_service,
    state::SharedState,
};

const FETCH_FAILED: &str = "Failed to fetch player state";
const SAVE_FAILED: &str = "Failed to save player state";
const CLEAR_FAILED: &str = "Failed to clear player state";

/// Anonymous player state endpoints; the caller names the user.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/api/sample/kv",
        get(get_player_state)
            .post(save_player_state)
            .delete(clear_player_state),
    )
}

#[utoipa::path(
    get,
    path = "/api/sample/kv",
    tag = "player-state",
    params(UserQuery),
    responses(
        (status = 200, description = "Stored state, or null data when none exists", body = DataResponse<PlayerState>),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
/// Return the stored state of the requested user.
pub async fn get_player_state(
    State(state): State<SharedState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<DataResponse<PlayerState>>, AppError> {
    let query = UserQuery::from_pairs(pairs);
    let payload = player_state_service::get_player_state(&state, query.user_id.as_deref())
        .await
        .map_err(AppError::failed(FETCH_FAILED))?;
    Ok(Json(payload))
}

#[utoipa::path(
    post,
    path = "/api/sample/kv",
    tag = "player-state",
    request_body = SavePlayerStateRequest,
    responses(
        (status = 200, description = "State saved and echoed back", body = DataResponse<PlayerState>),
        (status = 400, description = "Score missing, negative or not a number, or level not a number", body = ErrorResponse),
        (status = 500, description = "Malformed body or storage failure", body = ErrorResponse)
    )
)]
/// Overwrite the state of the user named in the body.
pub async fn save_player_state(
    State(state): State<SharedState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<DataResponse<PlayerState>>, AppError> {
    let body = body.map_err(|err| AppError::from_service(err.into(), SAVE_FAILED))?;
    let payload = player_state_service::save_player_state(&state, &body)
        .await
        .map_err(AppError::failed(SAVE_FAILED))?;
    Ok(Json(payload))
}

#[utoipa::path(
    delete,
    path = "/api/sample/kv",
    tag = "player-state",
    params(UserQuery),
    responses(
        (status = 200, description = "State removed (or was already absent)", body = AckResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
/// Remove the stored state of the requested user.
pub async fn clear_player_state(
    State(state): State<SharedState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<AckResponse>, AppError> {
    let query = UserQuery::from_pairs(pairs);
    let payload = player_state_service::clear_player_state(&state, query.user_id.as_deref())
        .await
        .map_err(AppError::failed(CLEAR_FAILED))?;
    Ok(Json(payload))
}
