//! Detection and reference lookup endpoints.
//!
//! - `POST /api/detect`: rank conditions for a note without touching a case
//! - `GET /api/reference/conditions`: condition names
//! - `GET /api/reference/conditions/:name`: ICD codes, baskets and medicines

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::claim::ConditionMatch;
use crate::models::{Condition, Medicine, Treatment};

#[derive(Deserialize)]
pub struct DetectRequest {
    pub note: String,
}

#[derive(Serialize)]
pub struct DetectResponse {
    pub related: bool,
    pub matches: Vec<ConditionMatch>,
}

/// `POST /api/detect`
pub async fn detect(
    State(ctx): State<ApiContext>,
    Json(req): Json<DetectRequest>,
) -> Json<DetectResponse> {
    let detector = ctx.core.detector();
    Json(DetectResponse {
        related: detector.is_related(&req.note),
        matches: detector.score(&req.note),
    })
}

/// `GET /api/reference/conditions`
pub async fn conditions(State(ctx): State<ApiContext>) -> Json<Vec<String>> {
    Json(
        ctx.core
            .catalog()
            .condition_names()
            .into_iter()
            .map(String::from)
            .collect(),
    )
}

#[derive(Serialize)]
pub struct ConditionDetail {
    pub name: String,
    pub icd_codes: Vec<Condition>,
    pub treatment: Option<Treatment>,
    pub medicines: Vec<Medicine>,
}

/// `GET /api/reference/conditions/:name`
pub async fn condition(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
) -> Result<Json<ConditionDetail>, ApiError> {
    let catalog = ctx.core.catalog();
    let canonical = catalog
        .canonical_name(&name)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown condition: {name}")))?
        .to_string();

    Ok(Json(ConditionDetail {
        icd_codes: catalog.codes_for(&canonical),
        treatment: catalog.treatment_for(&canonical).cloned(),
        medicines: catalog.medicines_for(&canonical),
        name: canonical,
    }))
}
