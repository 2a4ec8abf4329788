//! Patient endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::endpoints::parse_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::enums::Plan;
use crate::models::{Case, Patient};

#[derive(Deserialize)]
pub struct CreatePatientRequest {
    pub full_name: String,
    pub plan: Plan,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub medical_aid_number: Option<String>,
}

/// `POST /api/patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(req): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let full_name = req.full_name.trim();
    if full_name.is_empty() {
        return Err(ApiError::BadRequest("full_name is required".into()));
    }
    let mut patient = Patient::new(full_name, req.plan);
    patient.date_of_birth = req.date_of_birth;
    patient.medical_aid_number = req
        .medical_aid_number
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let patient = ctx.core.create_patient(patient)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Patient>>, ApiError> {
    Ok(Json(ctx.core.list_patients()?))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&patient_id, "patient")?;
    Ok(Json(ctx.core.get_patient(id)?))
}

/// `GET /api/patients/:id/cases`: newest first.
pub async fn cases(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<Case>>, ApiError> {
    let id = parse_id(&patient_id, "patient")?;
    Ok(Json(ctx.core.list_cases(id)?))
}
