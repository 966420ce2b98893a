//! Anonymous player state: one overwrite-only record per client-chosen user id.

use std::time::SystemTime;

use tracing::debug;

use crate::{
    dao::keys::player_state_key,
    dto::{
        envelope::{AckResponse, DataResponse},
        format_system_time,
        player_state::{PlayerState, SavePlayerStateRequest},
        validation::{validate_level, validate_score},
    },
    error::ServiceError,
    state::SharedState,
};

/// Return the stored state of `user_id`, or a `null` payload when none exists.
pub async fn get_player_state(
    state: &SharedState,
    user_id: Option<&str>,
) -> Result<DataResponse<PlayerState>, ServiceError> {
    let key = player_state_key(state.config().resolve_user_id(user_id));
    let store = state.require_kv_store().await?;

    let Some(raw) = store.get(key.clone()).await? else {
        return Ok(DataResponse::missing("No saved state found"));
    };

    let player_state = serde_json::from_str::<PlayerState>(&raw)
        .map_err(|source| ServiceError::CorruptRecord { key, source })?;
    Ok(DataResponse::found(player_state))
}

/// Validate `body`, stamp it with the current time and overwrite the stored state.
pub async fn save_player_state(
    state: &SharedState,
    body: &[u8],
) -> Result<DataResponse<PlayerState>, ServiceError> {
    let value = serde_json::from_slice::<serde_json::Value>(body)
        .map_err(ServiceError::MalformedBody)?;
    // A body that is valid JSON but not an object has no score to speak of.
    let request = match value {
        object @ serde_json::Value::Object(_) => {
            serde_json::from_value::<SavePlayerStateRequest>(object).unwrap_or_default()
        }
        _ => SavePlayerStateRequest::default(),
    };

    let score = validate_score(request.score.as_ref())
        .map_err(|err| ServiceError::invalid(err, "Invalid score value"))?;
    let level = validate_level(request.level.as_ref())
        .map_err(|err| ServiceError::invalid(err, "Invalid level value"))?;

    let player_state = PlayerState {
        score,
        level,
        last_played: format_system_time(SystemTime::now()),
    };

    let key = player_state_key(state.config().resolve_user_id(request.user_id()));
    let encoded = serde_json::to_string(&player_state).map_err(ServiceError::Encode)?;
    let store = state.require_kv_store().await?;
    store.put(key.clone(), encoded).await?;
    debug!(key = %key, "player state saved");

    Ok(DataResponse::stored(
        player_state,
        "Player state saved successfully",
    ))
}

/// Remove the stored state of `user_id`; succeeds when nothing was stored.
pub async fn clear_player_state(
    state: &SharedState,
    user_id: Option<&str>,
) -> Result<AckResponse, ServiceError> {
    let key = player_state_key(state.config().resolve_user_id(user_id));
    let store = state.require_kv_store().await?;
    store.delete(key).await?;
    Ok(AckResponse::new("Player state cleared successfully"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        auth::RejectAllVerifier,
        config::AppConfig,
        dao::kv_store::{KvStore, MemoryKvStore},
        state::AppState,
    };

    fn setup() -> (SharedState, MemoryKvStore) {
        let store = MemoryKvStore::new();
        let state = AppState::with_store(
            AppConfig::default(),
            Arc::new(store.clone()),
            Arc::new(RejectAllVerifier),
        );
        (state, store)
    }

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[tokio::test]
    async fn save_defaults_level_and_user() {
        let (state, store) = setup();
        let saved = save_player_state(&state, &body(json!({"score": 10})))
            .await
            .unwrap();
        let data = saved.data.unwrap();
        assert_eq!(data.score, 10.into());
        assert_eq!(data.level, 1.into());
        assert!(store.peek("user:demo-user:state").is_some());
    }

    #[tokio::test]
    async fn client_timestamp_is_ignored() {
        let (state, _) = setup();
        let saved = save_player_state(
            &state,
            &body(json!({"score": 1, "lastPlayed": "1999-01-01T00:00:00Z"})),
        )
        .await
        .unwrap();
        assert_ne!(saved.data.unwrap().last_played, "1999-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn body_user_id_selects_key() {
        let (state, store) = setup();
        save_player_state(&state, &body(json!({"score": 3, "userId": "alice"})))
            .await
            .unwrap();
        assert!(store.peek("user:alice:state").is_some());

        let fetched = get_player_state(&state, Some("alice")).await.unwrap();
        assert_eq!(fetched.data.unwrap().score, 3.into());
    }

    #[tokio::test]
    async fn invalid_score_leaves_store_untouched() {
        let (state, store) = setup();
        for invalid in [json!({"score": -1}), json!({"score": "5"}), json!({}), json!([1])] {
            let err = save_player_state(&state, &body(invalid)).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(ref m) if m == "Invalid score value"));
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_not_a_validation_error() {
        let (state, _) = setup();
        let err = save_player_state(&state, b"{score: 1").await.unwrap_err();
        assert!(matches!(err, ServiceError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn missing_state_returns_empty_payload() {
        let (state, _) = setup();
        let fetched = get_player_state(&state, Some("nobody")).await.unwrap();
        assert!(fetched.data.is_none());
        assert_eq!(fetched.message.as_deref(), Some("No saved state found"));
    }

    #[tokio::test]
    async fn corrupt_record_is_reported() {
        let (state, store) = setup();
        store
            .put("user:demo-user:state".into(), "not json".into())
            .await
            .unwrap();
        let err = get_player_state(&state, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::CorruptRecord { .. }));
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let (state, store) = setup();
        save_player_state(&state, &body(json!({"score": 2})))
            .await
            .unwrap();
        clear_player_state(&state, None).await.unwrap();
        clear_player_state(&state, None).await.unwrap();
        assert!(store.is_empty());
    }
}
