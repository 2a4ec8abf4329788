//! Case workflow endpoints.
//!
//! Every mutation runs against the open in-memory workflow and answers with
//! the operation result plus the case as it now stands. Only `save`,
//! `archive` and encounter completion write to the store; an archived case
//! is dropped from the open set.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CaseResponse, CodeRequest};
use crate::claim::{CaseView, ClaimDocument, ConditionMatch, SelectionChange};
use crate::models::enums::{BasketType, Plan, WorkflowStep};
use crate::models::{MedicineAvailability, SelectedBasketItem, StoredAttachment};

type CaseResult<T> = Result<Json<CaseResponse<T>>, ApiError>;

/// Run a workflow operation and pair its result with the updated view.
fn mutate<T: Serialize>(
    ctx: &ApiContext,
    case_id: &str,
    op: impl FnOnce(
        &mut crate::claim::CaseWorkflow,
        &crate::core_state::Services<'_>,
    ) -> Result<T, crate::claim::ClaimError>,
) -> CaseResult<T> {
    let id = parse_id(case_id, "case")?;
    let response = ctx.core.with_workflow(id, |wf, services| {
        let result = op(wf, services)?;
        Ok(CaseResponse {
            result,
            case: wf.view(),
        })
    })?;
    Ok(Json(response))
}

// ── Lifecycle ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StartCaseRequest {
    #[serde(default)]
    pub plan: Option<Plan>,
}

/// `POST /api/patients/:id/cases`
pub async fn start(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
    body: Option<Json<StartCaseRequest>>,
) -> Result<(StatusCode, Json<CaseView>), ApiError> {
    let patient_id = parse_id(&patient_id, "patient")?;
    let plan = body.and_then(|Json(req)| req.plan);
    let view = ctx.core.start_case(patient_id, plan)?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /api/cases/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
) -> Result<Json<CaseView>, ApiError> {
    let id = parse_id(&case_id, "case")?;
    Ok(Json(ctx.core.case_view(id)?))
}

/// `DELETE /api/cases/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&case_id, "case")?;
    ctx.core.delete_case(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/cases/:id/save`
pub async fn save(State(ctx): State<ApiContext>, Path(case_id): Path<String>) -> CaseResult<()> {
    mutate(&ctx, &case_id, |wf, s| wf.save(s.store))
}

/// `POST /api/cases/:id/archive`
pub async fn archive(State(ctx): State<ApiContext>, Path(case_id): Path<String>) -> CaseResult<()> {
    let id = parse_id(&case_id, "case")?;
    let view = ctx.core.archive_case(id)?;
    Ok(Json(CaseResponse { result: (), case: view }))
}

/// `GET /api/cases/:id/export`
pub async fn export(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
) -> Result<Json<ClaimDocument>, ApiError> {
    let id = parse_id(&case_id, "case")?;
    Ok(Json(ctx.core.export(id)?))
}

// ── Note and condition ──────────────────────────────────────

#[derive(Deserialize)]
pub struct NoteRequest {
    pub note: String,
}

/// `POST /api/cases/:id/note`
pub async fn note(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
    Json(req): Json<NoteRequest>,
) -> CaseResult<Vec<ConditionMatch>> {
    mutate(&ctx, &case_id, |wf, s| wf.enter_note(&req.note, s.detector))
}

#[derive(Deserialize)]
pub struct ConditionRequest {
    pub condition: String,
}

/// `POST /api/cases/:id/condition`
pub async fn condition(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
    Json(req): Json<ConditionRequest>,
) -> CaseResult<()> {
    mutate(&ctx, &case_id, |wf, s| wf.choose_condition(&req.condition, s.catalog))
}

/// `POST /api/cases/:id/icd-codes`: toggles one code.
pub async fn icd_code(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
    Json(req): Json<CodeRequest>,
) -> CaseResult<SelectionChange> {
    mutate(&ctx, &case_id, |wf, s| wf.toggle_icd_code(&req.code, s.catalog))
}

// ── Baskets ─────────────────────────────────────────────────

/// `POST /api/cases/:id/baskets/:basket_type/items`: toggles one item.
pub async fn basket_item(
    State(ctx): State<ApiContext>,
    Path((case_id, basket_type)): Path<(String, BasketType)>,
    Json(req): Json<CodeRequest>,
) -> CaseResult<SelectionChange> {
    mutate(&ctx, &case_id, |wf, s| {
        wf.toggle_basket_item(basket_type, &req.code, s.catalog)
    })
}

#[derive(Deserialize)]
pub struct QuantityRequest {
    pub quantity: i64,
}

/// `PUT /api/cases/:id/baskets/:basket_type/items/:code/quantity`
pub async fn quantity(
    State(ctx): State<ApiContext>,
    Path((case_id, basket_type, code)): Path<(String, BasketType, String)>,
    Json(req): Json<QuantityRequest>,
) -> CaseResult<u32> {
    mutate(&ctx, &case_id, |wf, _| wf.set_quantity(basket_type, &code, req.quantity))
}

#[derive(Deserialize)]
pub struct DocumentationRequest {
    #[serde(default)]
    pub note: String,
    /// Attachments previously returned by the upload endpoint.
    #[serde(default)]
    pub files: Vec<StoredAttachment>,
}

/// `PUT /api/cases/:id/baskets/:basket_type/items/:code/documentation`
pub async fn documentation(
    State(ctx): State<ApiContext>,
    Path((case_id, basket_type, code)): Path<(String, BasketType, String)>,
    Json(req): Json<DocumentationRequest>,
) -> CaseResult<()> {
    let case_uuid = parse_id(&case_id, "case")?;
    if let Some(foreign) = req.files.iter().find(|f| f.case_id != case_uuid) {
        return Err(ApiError::BadRequest(format!(
            "Attachment {} belongs to another case",
            foreign.id
        )));
    }
    mutate(&ctx, &case_id, |wf, _| {
        wf.document_item(basket_type, &code, &req.note, req.files)
    })
}

/// `POST /api/cases/:id/skip-ongoing`
pub async fn skip_ongoing(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
) -> CaseResult<WorkflowStep> {
    mutate(&ctx, &case_id, |wf, _| wf.skip_ongoing())
}

/// `GET /api/cases/:id/admissible`: ongoing items with coverage left.
pub async fn admissible(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
) -> Result<Json<Vec<SelectedBasketItem>>, ApiError> {
    let id = parse_id(&case_id, "case")?;
    Ok(Json(ctx.core.with_workflow(id, |wf, _| Ok(wf.admissible_items()))?))
}

// ── Medicines and plan ──────────────────────────────────────

/// `GET /api/cases/:id/medicines`
pub async fn medicines(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
) -> Result<Json<Vec<MedicineAvailability>>, ApiError> {
    let id = parse_id(&case_id, "case")?;
    Ok(Json(ctx.core.with_workflow(id, |wf, s| {
        Ok(wf.medicine_availability(s.catalog))
    })?))
}

#[derive(Deserialize)]
pub struct MedicineRequest {
    pub medicine_name_strength: String,
}

/// `POST /api/cases/:id/medicines`: toggles one medicine.
pub async fn medicine(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
    Json(req): Json<MedicineRequest>,
) -> CaseResult<SelectionChange> {
    mutate(&ctx, &case_id, |wf, s| {
        wf.toggle_medicine(&req.medicine_name_strength, s.catalog)
    })
}

#[derive(Deserialize)]
pub struct PlanRequest {
    pub plan: Plan,
}

/// `PUT /api/cases/:id/plan`
pub async fn plan(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
    Json(req): Json<PlanRequest>,
) -> CaseResult<()> {
    mutate(&ctx, &case_id, |wf, _| wf.set_plan(req.plan))
}

// ── Navigation and notes ────────────────────────────────────

/// `POST /api/cases/:id/advance`
pub async fn advance(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
) -> CaseResult<WorkflowStep> {
    mutate(&ctx, &case_id, |wf, _| wf.advance())
}

/// `POST /api/cases/:id/back`
pub async fn back(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
) -> CaseResult<WorkflowStep> {
    mutate(&ctx, &case_id, |wf, _| wf.previous_step())
}

#[derive(Deserialize)]
pub struct RegistrationNoteRequest {
    pub body: String,
}

/// `POST /api/cases/:id/registration-notes`
pub async fn registration_note(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
    Json(req): Json<RegistrationNoteRequest>,
) -> CaseResult<()> {
    mutate(&ctx, &case_id, |wf, _| wf.add_registration_note(&req.body))
}
