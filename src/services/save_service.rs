//! Save data of authenticated players, keyed by the verified token subject.

use tracing::{debug, info};
use validator::Validate;

use crate::{
    dao::keys::save_data_key,
    dto::{
        envelope::{AckResponse, DataResponse},
        save_data::SaveData,
    },
    error::ServiceError,
    state::SharedState,
};

/// Message returned when the save header fields are missing or empty.
pub const INVALID_STRUCTURE_MESSAGE: &str = "Invalid save data structure";

/// Return the save data of `user_id`, or a `null` payload when none exists.
pub async fn get_save_data(
    state: &SharedState,
    user_id: &str,
) -> Result<DataResponse<SaveData>, ServiceError> {
    let key = save_data_key(user_id);
    let store = state.require_kv_store().await?;
    let raw = store.get(key.clone()).await?;
    debug!(key = %key, len = raw.as_ref().map_or(0, String::len), "read save data");

    let Some(raw) = raw else {
        return Ok(DataResponse::missing("No saved data found"));
    };

    let save = serde_json::from_str::<SaveData>(&raw)
        .map_err(|source| ServiceError::CorruptRecord { key, source })?;
    Ok(DataResponse::found(save))
}

/// Validate the save header of `body` and overwrite the stored save data with it.
pub async fn store_save_data(
    state: &SharedState,
    user_id: &str,
    body: &[u8],
) -> Result<AckResponse, ServiceError> {
    let value = serde_json::from_slice::<serde_json::Value>(body)
        .map_err(ServiceError::MalformedBody)?;
    let save = serde_json::from_value::<SaveData>(value)
        .map_err(|err| {
            debug!(error = %err, "save data header missing or mistyped");
            ServiceError::InvalidInput(INVALID_STRUCTURE_MESSAGE.to_owned())
        })?;
    save.validate()
        .map_err(|err| ServiceError::invalid_structure(&err, INVALID_STRUCTURE_MESSAGE))?;

    let key = save_data_key(user_id);
    let encoded = serde_json::to_string(&save).map_err(ServiceError::Encode)?;
    let len = encoded.len();
    let store = state.require_kv_store().await?;
    store.put(key.clone(), encoded).await?;
    info!(key = %key, len, "save data stored");

    Ok(AckResponse::new("Save data stored successfully"))
}

/// Remove the save data of `user_id`; succeeds when nothing was stored.
pub async fn clear_save_data(
    state: &SharedState,
    user_id: &str,
) -> Result<AckResponse, ServiceError> {
    let store = state.require_kv_store().await?;
    store.delete(save_data_key(user_id)).await?;
    Ok(AckResponse::new("Save data cleared successfully"))
}
