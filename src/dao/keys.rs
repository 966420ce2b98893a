//! Every record lives under `user:<id>:<kind>`, one record per user and kind.

const USER_PREFIX: &str = "user";

/// Key holding the anonymous player state of `user_id`.
pub fn player_state_key(user_id: &str) -> String {
    format!("{USER_PREFIX}:{user_id}:state")
}

/// Key holding the save data of the authenticated user `user_id`.
pub fn save_data_key(user_id: &str) -> String {
    format!("{USER_PREFIX}:{user_id}:savedata")
}
