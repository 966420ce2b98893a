use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::Validate;

/// Save file of an authenticated player.
///
/// Only the two header fields are checked; `packs`, `questions`, the volume
/// settings, `drill_mode` and any other field are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SaveData {
    /// Save format version; must not be empty.
    #[validate(length(min = 1, message = "version must not be empty"))]
    pub version: String,
    /// Name of the save layout; must not be empty.
    #[validate(length(min = 1, message = "save_structure must not be empty"))]
    pub save_structure: String,
    /// Every other field of the save, stored as received.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Documented shape of [`SaveData`] for the OpenAPI document.
#[derive(ToSchema)]
#[schema(as = SaveData)]
#[allow(dead_code)]
pub struct SaveDataSchema {
    version: String,
    save_structure: String,
    #[schema(value_type = Object)]
    packs: HashMap<String, Value>,
    #[schema(value_type = Object)]
    questions: HashMap<String, Vec<Value>>,
    sfx_volume: f64,
    music_volume: f64,
    drill_mode: Option<DrillModeSchema>,
}

/// Optional drill mode progress inside a save file.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct DrillModeSchema {
    high_score: f64,
}
