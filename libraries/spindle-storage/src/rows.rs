//! Column encoding shared by the slices

use chrono::{SecondsFormat, Utc};
use spindle_core::{Result, SpindleError};

/// Current time as fixed-width RFC 3339, so text order is time order
pub(crate) fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// JSON array columns (`tags`, `likes`, `fav_genres`, ...)
pub(crate) fn encode_list<T: serde::Serialize>(items: &[T]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}

pub(crate) fn decode_list<T: serde::de::DeserializeOwned>(raw: &str) -> Result<Vec<T>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

/// Unique-constraint failures become `Conflict`, everything else stays a
/// database error
pub(crate) fn conflict_or(err: sqlx::Error, message: &str) -> SpindleError {
    if is_unique_violation(&err) {
        SpindleError::conflict(message)
    } else {
        err.into()
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
