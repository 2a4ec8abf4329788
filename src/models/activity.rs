use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ActivityType;

/// Usage snapshot of one basket code at the time of the encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityAttachment {
    pub code: String,
    pub description: String,
    pub usage_count: u32,
}

/// Immutable follow-up encounter record. Append-only; the per-case log
/// of these is the source of truth for basket usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OngoingManagementActivity {
    pub id: Uuid,
    pub case_id: Uuid,
    pub activity_type: ActivityType,
    pub activity_date: NaiveDate,
    pub specialist_type: Option<String>,
    pub clinical_notes: String,
    pub attachments: Vec<ActivityAttachment>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl OngoingManagementActivity {
    /// Basket codes consumed by this encounter.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.attachments.iter().map(|a| a.code.as_str())
    }
}
