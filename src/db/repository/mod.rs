//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`. Ids are stored as text,
//! timestamps as RFC 3339, dates as `%Y-%m-%d`, selection snapshots as JSON.

mod activity;
mod case;
mod patient;
mod referral;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::DatabaseError;

pub use activity::*;
pub use case::*;
pub use patient::*;
pub use referral::*;

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {raw}: {e}")))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad date {raw}: {e}")))
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

/// Parse a JSON column into its typed form; malformed content is an
/// `InvalidRecord`, never a panic or a silently empty value.
pub(crate) fn from_json<T: DeserializeOwned>(
    entity_type: &str,
    id: &str,
    column: &str,
    raw: &str,
) -> Result<T, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::InvalidRecord {
        entity_type: entity_type.into(),
        id: id.into(),
        reason: format!("{column}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_through_text() {
        let now = Utc::now();
        assert_eq!(parse_timestamp(&now.to_rfc3339()).unwrap(), now);
    }

    #[test]
    fn malformed_json_is_invalid_record() {
        let err = from_json::<Vec<String>>("case", "abc", "detected_conditions", "{oops").unwrap_err();
        match err {
            DatabaseError::InvalidRecord { entity_type, id, reason } => {
                assert_eq!(entity_type, "case");
                assert_eq!(id, "abc");
                assert!(reason.starts_with("detected_conditions:"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_uuid_is_constraint_violation() {
        assert!(matches!(parse_uuid("nope"), Err(DatabaseError::ConstraintViolation(_))));
    }
}
