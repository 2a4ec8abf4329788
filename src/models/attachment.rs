use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A documentation file written to the attachment store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAttachment {
    pub id: Uuid,
    pub case_id: Uuid,
    pub file_name: String,
    /// Hex SHA-256 of the content; also the on-disk file name.
    pub content_hash: String,
    pub size_bytes: u64,
    pub stored_at: DateTime<Utc>,
}
