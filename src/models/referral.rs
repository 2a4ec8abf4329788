use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ReferralStatus, UrgencyLevel};

/// Specialist referral derived from a case. Lifecycle is independent of
/// the basket ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralLetter {
    pub id: Uuid,
    pub case_id: Uuid,
    pub patient_id: Uuid,
    pub specialist_type: String,
    pub urgency_level: UrgencyLevel,
    pub clinical_summary: String,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}
