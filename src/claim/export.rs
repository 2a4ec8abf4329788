use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::CaseStore;
use crate::models::enums::{BasketType, CaseStatus};
use crate::models::{Case, OngoingManagementActivity, Patient, ReferralLetter};

use super::types::ClaimError;
use super::workflow::CaseWorkflow;

/// Coverage consumed for one ongoing basket code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub code: String,
    pub description: String,
    pub coverage_limit: u32,
    pub usage_count: u32,
    pub remaining: u32,
}

/// Everything a renderer needs to produce the final claim.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimDocument {
    pub case: Case,
    pub patient: Option<Patient>,
    pub activities: Vec<OngoingManagementActivity>,
    pub referrals: Vec<ReferralLetter>,
    pub usage: Vec<UsageSummary>,
    pub generated_at: DateTime<Utc>,
}

impl ClaimDocument {
    /// Assemble the claim for a completed case. Usage figures come from
    /// replaying the stored activities.
    pub fn build(store: &dyn CaseStore, case_id: Uuid) -> Result<Self, ClaimError> {
        let case = store
            .load_case(&case_id)?
            .ok_or(ClaimError::CaseNotFound(case_id))?;
        if case.status != CaseStatus::Completed {
            return Err(ClaimError::InvalidTransition {
                action: "export",
                state: format!("case is {}", case.status),
            });
        }

        let activities = store.list_activities(&case_id)?;
        let patient = store.load_patient(&case.patient_id)?;
        let referrals = store.list_referrals(&case_id)?;

        let workflow = CaseWorkflow::from_parts(case, &activities);
        let usage = workflow
            .ledger()
            .items_in(BasketType::Ongoing)
            .map(|item| UsageSummary {
                code: item.code.clone(),
                description: item.description.clone(),
                coverage_limit: item.coverage_limit,
                usage_count: item.usage_count,
                remaining: item.remaining(),
            })
            .collect();

        tracing::info!(%case_id, activities = activities.len(), "Claim document built");
        Ok(Self {
            case: workflow.case().clone(),
            patient,
            activities,
            referrals,
            usage,
            generated_at: Utc::now(),
        })
    }
}
