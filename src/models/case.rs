use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::basket::SelectedBasketItem;
use super::condition::Condition;
use super::enums::{BasketType, CaseStatus, Plan, WorkflowStep};
use super::medicine::Medicine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationNote {
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate root of a chronic claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_note: String,
    pub detected_conditions: Vec<String>,
    pub confirmed_condition: Option<String>,
    pub selected_icd_codes: Vec<Condition>,
    pub selected_treatments: Vec<SelectedBasketItem>,
    pub selected_medications: Vec<Medicine>,
    pub chronic_registration_notes: Vec<RegistrationNote>,
    pub active_plan: Plan,
    pub current_step: WorkflowStep,
    /// Set when the clinician explicitly skipped the ongoing basket.
    #[serde(default)]
    pub ongoing_skipped: bool,
    pub status: CaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Case {
    pub fn new(patient_id: Uuid, plan: Plan) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            patient_id,
            patient_note: String::new(),
            detected_conditions: Vec::new(),
            confirmed_condition: None,
            selected_icd_codes: Vec::new(),
            selected_treatments: Vec::new(),
            selected_medications: Vec::new(),
            chronic_registration_notes: Vec::new(),
            active_plan: plan,
            current_step: WorkflowStep::NoteEntry,
            ongoing_skipped: false,
            status: CaseStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn items_in(&self, basket_type: BasketType) -> impl Iterator<Item = &SelectedBasketItem> {
        self.selected_treatments
            .iter()
            .filter(move |i| i.basket_type == basket_type)
    }

    pub fn latest_registration_note(&self) -> Option<&RegistrationNote> {
        self.chronic_registration_notes.last()
    }
}
