//! Ongoing-management encounter endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CaseResponse, CodeRequest};
use crate::claim::{CaseView, CompletedEncounter, EncounterDetails, EncounterDraft, SelectionChange};
use crate::models::OngoingManagementActivity;

type CaseResult<T> = Result<Json<CaseResponse<T>>, ApiError>;

/// `POST /api/cases/:id/encounters`
pub async fn begin(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
    Json(details): Json<EncounterDetails>,
) -> CaseResult<EncounterDraft> {
    let id = parse_id(&case_id, "case")?;
    let response = ctx.core.with_workflow(id, |wf, _| {
        let draft = wf.begin_encounter(details)?.clone();
        Ok(CaseResponse {
            result: draft,
            case: wf.view(),
        })
    })?;
    Ok(Json(response))
}

/// `GET /api/cases/:id/encounters`: recorded activities in replay order.
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
) -> Result<Json<Vec<OngoingManagementActivity>>, ApiError> {
    let id = parse_id(&case_id, "case")?;
    let activities = ctx
        .core
        .with_workflow(id, |_, s| Ok(s.store.list_activities(&id)?))?;
    Ok(Json(activities))
}

/// `POST /api/cases/:id/encounters/codes`: toggles one code on the open encounter.
pub async fn code(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
    Json(req): Json<CodeRequest>,
) -> CaseResult<SelectionChange> {
    let id = parse_id(&case_id, "case")?;
    let response = ctx.core.with_workflow(id, |wf, _| {
        let result = wf.toggle_encounter_code(&req.code)?;
        Ok(CaseResponse {
            result,
            case: wf.view(),
        })
    })?;
    Ok(Json(response))
}

#[derive(Deserialize)]
pub struct CompleteRequest {
    pub created_by: String,
}

/// `POST /api/cases/:id/encounters/complete`
pub async fn complete(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
    Json(req): Json<CompleteRequest>,
) -> CaseResult<CompletedEncounter> {
    let created_by = req.created_by.trim();
    if created_by.is_empty() {
        return Err(ApiError::BadRequest("created_by is required".into()));
    }
    let id = parse_id(&case_id, "case")?;
    let response = ctx.core.with_workflow(id, |wf, s| {
        let result = wf.complete_encounter(s.store, created_by)?;
        Ok(CaseResponse {
            result,
            case: wf.view(),
        })
    })?;
    Ok(Json(response))
}

/// `DELETE /api/cases/:id/encounters/current`
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
) -> Result<Json<CaseView>, ApiError> {
    let id = parse_id(&case_id, "case")?;
    let view = ctx.core.with_workflow(id, |wf, _| {
        wf.cancel_encounter()?;
        Ok(wf.view())
    })?;
    Ok(Json(view))
}
