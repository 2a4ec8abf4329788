//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::attachments::StorageError;
use crate::claim::ClaimError;
use crate::core_state::CoreError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Claim(ClaimError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Claim(err) => {
                let (status, code) = claim_status(err);
                let message = match err {
                    ClaimError::PersistenceFailure(detail) => {
                        tracing::error!(detail, "Persistence failure");
                        "Changes could not be saved; retry".to_string()
                    }
                    other => other.to_string(),
                };
                (status, code, message)
            }
        }
    }
}

fn claim_status(err: &ClaimError) -> (StatusCode, &'static str) {
    match err {
        ClaimError::EmptyNote => (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_NOTE"),
        ClaimError::OutOfDomainNote => (StatusCode::UNPROCESSABLE_ENTITY, "OUT_OF_DOMAIN_NOTE"),
        ClaimError::NoConditionDetected => (StatusCode::UNPROCESSABLE_ENTITY, "NO_CONDITION_DETECTED"),
        ClaimError::ConditionNotDetected(_) => (StatusCode::UNPROCESSABLE_ENTITY, "CONDITION_NOT_DETECTED"),
        ClaimError::UnknownCondition(_)
        | ClaimError::UnknownIcdCode(_)
        | ClaimError::UnknownItem { .. }
        | ClaimError::UnknownMedicine(_) => (StatusCode::UNPROCESSABLE_ENTITY, "UNKNOWN_REFERENCE"),
        ClaimError::InvalidQuantity { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_QUANTITY"),
        ClaimError::CoverageLimitReached { .. } => (StatusCode::CONFLICT, "COVERAGE_LIMIT_REACHED"),
        ClaimError::NotSelected(_) => (StatusCode::UNPROCESSABLE_ENTITY, "NOT_SELECTED"),
        ClaimError::IncompleteSelection(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INCOMPLETE_SELECTION"),
        ClaimError::PlanIncompatible { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "PLAN_INCOMPATIBLE"),
        ClaimError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
        ClaimError::CaseNotFound(_) => (StatusCode::NOT_FOUND, "CASE_NOT_FOUND"),
        ClaimError::PersistenceFailure(_) => (StatusCode::SERVICE_UNAVAILABLE, "PERSISTENCE_FAILURE"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        ApiError::Claim(err)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Claim(e) => ApiError::Claim(e),
            CoreError::PatientNotFound(id) => ApiError::NotFound(format!("Patient not found: {id}")),
            CoreError::ReferralNotFound(id) => ApiError::NotFound(format!("Referral not found: {id}")),
            CoreError::Storage(e) => e.into(),
            CoreError::LockPoisoned => ApiError::Internal("lock poisoned".into()),
            CoreError::Database(e) => ApiError::Internal(e.to_string()),
            CoreError::Reference(e) => ApiError::Internal(e.to_string()),
            CoreError::Startup(e) => ApiError::Internal(e),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Empty | StorageError::TooLarge | StorageError::InvalidFileName(_) => {
                ApiError::BadRequest(err.to_string())
            }
            StorageError::NotFound(hash) => ApiError::NotFound(format!("Attachment not found: {hash}")),
            StorageError::Io(_) => ApiError::Claim(err.into()),
        }
    }
}
