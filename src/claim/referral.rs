use chrono::Utc;
use uuid::Uuid;

use crate::models::enums::{ReferralStatus, UrgencyLevel};
use crate::models::{Case, ReferralLetter};

use super::messages::referral_summary;
use super::types::{ClaimError, Guard};

/// New draft referral for a case with a confirmed condition. A blank
/// summary is replaced by one composed from the case.
pub fn draft_referral(
    case: &Case,
    specialist_type: &str,
    urgency_level: UrgencyLevel,
    clinical_summary: Option<&str>,
) -> Result<ReferralLetter, ClaimError> {
    if case.confirmed_condition.is_none() {
        return Err(ClaimError::IncompleteSelection(Guard::ConditionNotChosen));
    }
    let specialist_type = specialist_type.trim();
    if specialist_type.is_empty() {
        return Err(ClaimError::IncompleteSelection(Guard::NoSpecialistType));
    }
    let clinical_summary = clinical_summary
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| referral_summary(case));

    let letter = ReferralLetter {
        id: Uuid::new_v4(),
        case_id: case.id,
        patient_id: case.patient_id,
        specialist_type: specialist_type.to_string(),
        urgency_level,
        clinical_summary,
        status: ReferralStatus::Draft,
        created_at: Utc::now(),
        sent_at: None,
    };
    tracing::info!(case_id = %case.id, referral_id = %letter.id, %urgency_level, "Referral drafted");
    Ok(letter)
}

/// draft → sent
pub fn mark_sent(letter: &mut ReferralLetter) -> Result<(), ClaimError> {
    transition(letter, "send", &[ReferralStatus::Draft], ReferralStatus::Sent)?;
    letter.sent_at = Some(Utc::now());
    Ok(())
}

/// sent → acknowledged
pub fn acknowledge(letter: &mut ReferralLetter) -> Result<(), ClaimError> {
    transition(letter, "acknowledge", &[ReferralStatus::Sent], ReferralStatus::Acknowledged)
}

/// draft | sent → cancelled
pub fn cancel(letter: &mut ReferralLetter) -> Result<(), ClaimError> {
    transition(
        letter,
        "cancel",
        &[ReferralStatus::Draft, ReferralStatus::Sent],
        ReferralStatus::Cancelled,
    )
}

fn transition(
    letter: &mut ReferralLetter,
    action: &'static str,
    from: &[ReferralStatus],
    to: ReferralStatus,
) -> Result<(), ClaimError> {
    if !from.contains(&letter.status) {
        return Err(ClaimError::InvalidTransition {
            action,
            state: format!("referral is {}", letter.status),
        });
    }
    tracing::info!(referral_id = %letter.id, from = %letter.status, %to, "Referral status changed");
    letter.status = to;
    Ok(())
}
