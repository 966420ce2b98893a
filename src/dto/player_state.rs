use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use utoipa::{IntoParams, ToSchema};

/// Progress record of an anonymous player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Non-negative score.
    #[schema(value_type = f64, minimum = 0)]
    pub score: Number,
    /// Player level, 1 unless the client sent one.
    #[schema(value_type = f64)]
    pub level: Number,
    /// RFC 3339 timestamp set by the server on every write.
    pub last_played: String,
}

/// Body of `POST /api/sample/kv`.
///
/// Fields stay untyped so a wrongly typed score is reported as a validation
/// failure instead of a malformed body.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavePlayerStateRequest {
    /// Required non-negative number.
    #[serde(default)]
    #[schema(value_type = f64, minimum = 0)]
    pub score: Option<Value>,
    /// Defaults to 1 when missing or null.
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub level: Option<Value>,
    /// Target player; the default user when missing or empty.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub user_id: Option<Value>,
}

impl SavePlayerStateRequest {
    /// The requested user id when it is a non-empty string.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id
            .as_ref()
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }
}

/// Query string accepted by the read and delete routes.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Player whose state is addressed; the default user when missing or empty.
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

impl UserQuery {
    /// Build from raw query pairs, keeping the first `userId` and ignoring any repeat.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let user_id = pairs
            .into_iter()
            .find_map(|(key, value)| (key == "userId").then_some(value));
        Self { user_id }
    }
}
