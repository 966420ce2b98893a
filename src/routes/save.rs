use axum::{
    Json, Router,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::HeaderMap,
    routing::get,
};

use crate::{
    auth::{AuthOutcome, authenticate},
    dto::{
        envelope::{AckResponse, DataResponse, ErrorResponse},
        save_data::{SaveData, SaveDataSchema},
    },
    error::{AppError, ServiceError},
    services::save_service,
    state::SharedState,
};

const FETCH_FAILED: &str = "Failed to fetch save data";
const SAVE_FAILED: &str = "Failed to save data";
const CLEAR_FAILED: &str = "Failed to clear save data";

/// Save data endpoints for players holding a verified bearer token.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/api/save",
        get(get_save_data)
            .post(store_save_data)
            .delete(clear_save_data),
    )
}

/// Resolve the caller's subject, short-circuiting with 401 when unauthenticated.
async fn authorized_user(
    state: &SharedState,
    headers: &HeaderMap,
    failure: &'static str,
) -> Result<String, AppError> {
    let outcome = authenticate(state.verifier(), headers)
        .await
        .map_err(|err| AppError::from_service(ServiceError::from(err), failure))?;

    match outcome {
        AuthOutcome::Authorized(user_id) => Ok(user_id),
        AuthOutcome::Unauthorized => Err(AppError::Unauthorized),
    }
}

#[utoipa::path(
    get,
    path = "/api/save",
    tag = "save",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Stored save, or null data when none exists", body = DataResponse<SaveDataSchema>),
        (status = 401, description = "Missing or rejected bearer token", body = ErrorResponse),
        (status = 500, description = "Storage or token authority failure", body = ErrorResponse)
    )
)]
/// Return the save data of the authenticated player.
pub async fn get_save_data(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<DataResponse<SaveData>>, AppError> {
    let user_id = authorized_user(&state, &headers, FETCH_FAILED).await?;
    let payload = save_service::get_save_data(&state, &user_id)
        .await
        .map_err(AppError::failed(FETCH_FAILED))?;
    Ok(Json(payload))
}

#[utoipa::path(
    post,
    path = "/api/save",
    tag = "save",
    security(("bearer" = [])),
    request_body = SaveDataSchema,
    responses(
        (status = 200, description = "Save stored", body = AckResponse),
        (status = 400, description = "version or save_structure missing or empty", body = ErrorResponse),
        (status = 401, description = "Missing or rejected bearer token", body = ErrorResponse),
        (status = 500, description = "Malformed body, storage or token authority failure", body = ErrorResponse)
    )
)]
/// Overwrite the save data of the authenticated player with the request body.
pub async fn store_save_data(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AckResponse>, AppError> {
    let user_id = authorized_user(&state, &headers, SAVE_FAILED).await?;
    let body = body.map_err(|err| AppError::from_service(err.into(), SAVE_FAILED))?;
    let payload = save_service::store_save_data(&state, &user_id, &body)
        .await
        .map_err(AppError::failed(SAVE_FAILED))?;
    Ok(Json(payload))
}

#[utoipa::path(
    delete,
    path = "/api/save",
    tag = "save",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Save removed (or was already absent)", body = AckResponse),
        (status = 401, description = "Missing or rejected bearer token", body = ErrorResponse),
        (status = 500, description = "Storage or token authority failure", body = ErrorResponse)
    )
)]
/// Reset the progress of the authenticated player.
pub async fn clear_save_data(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<AckResponse>, AppError> {
    let user_id = authorized_user(&state, &headers, CLEAR_FAILED).await?;
    let payload = save_service::clear_save_data(&state, &user_id)
        .await
        .map_err(AppError::failed(CLEAR_FAILED))?;
    Ok(Json(payload))
}
