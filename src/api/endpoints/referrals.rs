//! Specialist referral endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::parse_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::core_state::ReferralAction;
use crate::models::enums::UrgencyLevel;
use crate::models::ReferralLetter;

#[derive(Deserialize)]
pub struct DraftReferralRequest {
    pub specialist_type: String,
    pub urgency_level: UrgencyLevel,
    #[serde(default)]
    pub clinical_summary: Option<String>,
}

/// `POST /api/cases/:id/referrals`
pub async fn draft(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
    Json(req): Json<DraftReferralRequest>,
) -> Result<(StatusCode, Json<ReferralLetter>), ApiError> {
    let id = parse_id(&case_id, "case")?;
    let letter = ctx.core.draft_referral(
        id,
        &req.specialist_type,
        req.urgency_level,
        req.clinical_summary.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(letter)))
}

/// `GET /api/cases/:id/referrals`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
) -> Result<Json<Vec<ReferralLetter>>, ApiError> {
    let id = parse_id(&case_id, "case")?;
    Ok(Json(ctx.core.list_referrals(id)?))
}

fn apply(ctx: &ApiContext, referral_id: &str, action: ReferralAction) -> Result<Json<ReferralLetter>, ApiError> {
    let id = parse_id(referral_id, "referral")?;
    Ok(Json(ctx.core.update_referral(id, action)?))
}

/// `POST /api/referrals/:id/send`
pub async fn send(
    State(ctx): State<ApiContext>,
    Path(referral_id): Path<String>,
) -> Result<Json<ReferralLetter>, ApiError> {
    apply(&ctx, &referral_id, ReferralAction::Send)
}

/// `POST /api/referrals/:id/acknowledge`
pub async fn acknowledge(
    State(ctx): State<ApiContext>,
    Path(referral_id): Path<String>,
) -> Result<Json<ReferralLetter>, ApiError> {
    apply(&ctx, &referral_id, ReferralAction::Acknowledge)
}

/// `POST /api/referrals/:id/cancel`
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Path(referral_id): Path<String>,
) -> Result<Json<ReferralLetter>, ApiError> {
    apply(&ctx, &referral_id, ReferralAction::Cancel)
}
