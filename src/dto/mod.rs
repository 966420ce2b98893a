use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// `success` envelopes wrapping every API response.
pub mod envelope;
/// Healthcheck payload.
pub mod health;
/// Anonymous player state records.
pub mod player_state;
/// Authenticated save data records.
pub mod save_data;
/// Field checks shared by request handlers.
pub mod validation;

/// Format a timestamp as RFC 3339 in UTC with millisecond precision.
pub fn format_system_time(time: SystemTime) -> String {
    let datetime = OffsetDateTime::from(time);
    let millis = datetime.millisecond();
    datetime
        .replace_millisecond(millis)
        .unwrap_or(datetime)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
