pub mod sqlite;
pub mod repository;

pub use sqlite::*;
pub use repository::*;

use chrono::{NaiveDateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Invalid JSON in column {column}: {reason}")]
    InvalidJson { column: &'static str, reason: String },
}

/// Storage format for timestamps. Fixed-width so text ordering matches time ordering.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Current UTC time, truncated to the precision we persist.
pub fn now_timestamp() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    parse_timestamp(&format_timestamp(&now))
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Lenient parse: accepts rows written with or without fractional seconds.
pub fn parse_timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap_or_default()
}

pub(crate) fn parse_uuid(s: &str) -> Result<uuid::Uuid, DatabaseError> {
    uuid::Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn from_json<T: serde::de::DeserializeOwned>(
    column: &'static str,
    raw: &str,
) -> Result<T, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::InvalidJson {
        column,
        reason: e.to_string(),
    })
}

pub(crate) fn to_json<T: serde::Serialize>(
    column: &'static str,
    value: &T,
) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::InvalidJson {
        column,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_roundtrip_keeps_microseconds() {
        let ts = now_timestamp();
        assert_eq!(parse_timestamp(&format_timestamp(&ts)), ts);
    }

    #[test]
    fn parse_timestamp_accepts_whole_seconds() {
        let ts = parse_timestamp("2024-01-15 10:00:00");
        assert_eq!(format_timestamp(&ts), "2024-01-15 10:00:00.000000");
    }

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let a = parse_timestamp("2024-01-15 10:00:00.5");
        let b = parse_timestamp("2024-01-15 10:00:00.123456");
        assert!(format_timestamp(&b) < format_timestamp(&a));
    }
}
