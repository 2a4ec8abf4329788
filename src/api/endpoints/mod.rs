//! API endpoint handlers, one module per resource.

pub mod attachments;
pub mod cases;
pub mod encounters;
pub mod health;
pub mod patients;
pub mod reference;
pub mod referrals;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Parse a path id, naming the entity in the error.
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid {entity} ID: {e}")))
}
