use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{BasketType, Plan};

// ═══════════════════════════════════════════════════════════
// Detection results
// ═══════════════════════════════════════════════════════════

/// A candidate condition with its keyword score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionMatch {
    pub condition: String,
    pub score: u32,
    /// Phrases that matched, in vocabulary order.
    pub matched_terms: Vec<String>,
}

// ═══════════════════════════════════════════════════════════
// Ledger results
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionChange {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    CoverageLimitReached,
    NotSelected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedCode {
    pub code: String,
    pub reason: RejectionReason,
}

/// Result of applying one encounter to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterOutcome {
    pub activity_id: Uuid,
    pub accepted: Vec<String>,
    pub rejected: Vec<RejectedCode>,
    /// True when the activity had already been applied and nothing changed.
    pub replayed: bool,
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// The workflow guard that was not satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "guard", content = "code", rename_all = "snake_case")]
pub enum Guard {
    ConditionNotChosen,
    NoIcdCodes,
    NoDiagnosticItems,
    DiagnosticQuantity(String),
    NoOngoingItems,
    OngoingQuantity(String),
    NoMedicines,
    NoEncounterCodes,
    NoSpecialistType,
}

impl std::fmt::Display for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Guard::ConditionNotChosen => write!(f, "no condition chosen from the detected list"),
            Guard::NoIcdCodes => write!(f, "no ICD-10 code selected"),
            Guard::NoDiagnosticItems => write!(f, "no diagnostic basket item selected"),
            Guard::DiagnosticQuantity(code) => {
                write!(f, "diagnostic item {code} needs a quantity within its coverage limit")
            }
            Guard::NoOngoingItems => write!(f, "no ongoing management item selected"),
            Guard::OngoingQuantity(code) => {
                write!(f, "ongoing item {code} needs a quantity within its coverage limit")
            }
            Guard::NoMedicines => write!(f, "no medicine selected"),
            Guard::NoEncounterCodes => write!(f, "no basket item selected for this encounter"),
            Guard::NoSpecialistType => write!(f, "no specialist type given"),
        }
    }
}

/// Errors raised by detection, the basket ledger and the case workflow.
/// None are fatal: the step simply does not advance.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClaimError {
    #[error("Clinical note is empty")]
    EmptyNote,
    #[error("Note does not describe a chronic condition")]
    OutOfDomainNote,
    #[error("No known condition detected in the note")]
    NoConditionDetected,
    #[error("Condition was not among the detected candidates: {0}")]
    ConditionNotDetected(String),
    #[error("Unknown condition: {0}")]
    UnknownCondition(String),
    #[error("Unknown ICD-10 code for this condition: {0}")]
    UnknownIcdCode(String),
    #[error("Unknown {basket_type} basket item: {code}")]
    UnknownItem { basket_type: BasketType, code: String },
    #[error("Unknown medicine for this condition: {0}")]
    UnknownMedicine(String),
    #[error("Invalid quantity {quantity} for {code} (coverage limit {limit})")]
    InvalidQuantity { code: String, quantity: i64, limit: u32 },
    #[error("Coverage limit reached for {code} ({usage} of {limit} used)")]
    CoverageLimitReached { code: String, usage: u32, limit: u32 },
    #[error("Basket item is not selected on this case: {0}")]
    NotSelected(String),
    #[error("Incomplete selection: {0}")]
    IncompleteSelection(Guard),
    #[error("{medicine} is excluded under the {} plan", plan.label())]
    PlanIncompatible { medicine: String, plan: Plan },
    #[error("Cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: String },
    #[error("Case not found: {0}")]
    CaseNotFound(Uuid),
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl From<DatabaseError> for ClaimError {
    fn from(err: DatabaseError) -> Self {
        tracing::warn!(error = %err, "Case store call failed");
        ClaimError::PersistenceFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_serializes_with_tag() {
        let json = serde_json::to_value(Guard::DiagnosticQuantity("4171".into())).unwrap();
        assert_eq!(json["guard"], "diagnostic_quantity");
        assert_eq!(json["code"], "4171");
    }

    #[test]
    fn plan_incompatible_uses_plan_label() {
        let err = ClaimError::PlanIncompatible {
            medicine: "Januvia 100mg".into(),
            plan: Plan::KeyCare,
        };
        assert_eq!(err.to_string(), "Januvia 100mg is excluded under the KeyCare plan");
    }

    #[test]
    fn database_error_becomes_persistence_failure() {
        let err: ClaimError = DatabaseError::ConstraintViolation("boom".into()).into();
        assert!(matches!(err, ClaimError::PersistenceFailure(_)));
    }
}
