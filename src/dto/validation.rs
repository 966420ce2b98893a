//! Validation helpers for request bodies that are checked field by field.

use serde_json::{Number, Value};
use validator::ValidationError;

/// Default level assigned when a player state is saved without one.
pub const DEFAULT_LEVEL: u64 = 1;

/// Accept a JSON number greater than or equal to zero.
///
/// ```ignore
/// validate_score(Some(&json!(10)))   // Ok(10)
/// validate_score(Some(&json!(-1)))   // Err - negative
/// validate_score(Some(&json!("10"))) // Err - not a number
/// ```
pub fn validate_score(score: Option<&Value>) -> Result<Number, ValidationError> {
    let number = match score {
        Some(Value::Number(number)) => number,
        _ => {
            let mut err = ValidationError::new("score_type");
            err.message = Some("Invalid score value".into());
            return Err(err);
        }
    };

    if number.as_f64().is_none_or(|value| value < 0.0) {
        let mut err = ValidationError::new("score_range");
        err.message = Some("Invalid score value".into());
        return Err(err);
    }

    Ok(number.clone())
}

/// Accept a JSON number, defaulting missing and `null` levels to [`DEFAULT_LEVEL`].
pub fn validate_level(level: Option<&Value>) -> Result<Number, ValidationError> {
    match level {
        None | Some(Value::Null) => Ok(Number::from(DEFAULT_LEVEL)),
        Some(Value::Number(number)) => Ok(number.clone()),
        Some(_) => {
            let mut err = ValidationError::new("level_type");
            err.message = Some("Invalid level value".into());
            Err(err)
        }
    }
}
