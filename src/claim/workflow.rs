use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::CaseStore;
use crate::models::enums::{ActivityType, BasketType, CaseStatus, Plan, WorkflowStep};
use crate::models::{
    ActivityAttachment, Case, ItemDocumentation, MedicineAvailability, OngoingManagementActivity,
    RegistrationNote, SelectedBasketItem, StoredAttachment,
};

use super::detection::ConditionDetector;
use super::ledger::{BasketLedger, EncounterKey, UsageEntry};
use super::messages::compose_registration_note;
use super::reference::ReferenceCatalog;
use super::types::{ClaimError, ConditionMatch, EncounterOutcome, Guard, SelectionChange};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// An ongoing-management encounter being assembled. Nothing is recorded
/// until it is completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterDraft {
    pub activity_id: Uuid,
    pub activity_type: ActivityType,
    pub activity_date: NaiveDate,
    pub specialist_type: Option<String>,
    pub clinical_notes: String,
    pub codes: Vec<String>,
    /// Step the case returns to when the encounter ends.
    pub return_to: WorkflowStep,
}

/// Clinician input that opens an encounter.
#[derive(Debug, Clone, Deserialize)]
pub struct EncounterDetails {
    pub activity_type: ActivityType,
    pub activity_date: NaiveDate,
    #[serde(default)]
    pub specialist_type: Option<String>,
    #[serde(default)]
    pub clinical_notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedEncounter {
    pub activity: OngoingManagementActivity,
    pub outcome: EncounterOutcome,
}

/// Serializable snapshot of a workflow for callers.
#[derive(Debug, Clone, Serialize)]
pub struct CaseView {
    pub case: Case,
    pub encounter: Option<EncounterDraft>,
    pub usage_log: Vec<UsageEntry>,
}

// ═══════════════════════════════════════════════════════════
// CaseWorkflow
// ═══════════════════════════════════════════════════════════

/// The state machine one case moves through, from clinical note to
/// finalized claim, plus re-entrant ongoing-management encounters.
///
/// All edits are in memory. `save`, `archive` and `complete_encounter` are
/// the only calls that touch the store, and each commits its in-memory
/// change only after the store call succeeds.
#[derive(Debug, Clone)]
pub struct CaseWorkflow {
    case: Case,
    ledger: BasketLedger,
    note_related: bool,
    encounter: Option<EncounterDraft>,
    /// Case as the store would give it back; `None` until first saved.
    stored: Option<Case>,
}

impl CaseWorkflow {
    /// New case at `NoteEntry` for a patient.
    pub fn start(patient_id: Uuid, plan: Plan) -> Self {
        let case = Case::new(patient_id, plan);
        tracing::info!(case_id = %case.id, %patient_id, plan = %plan, "Case started");
        let mut workflow = Self::from_parts(case, &[]);
        workflow.stored = None;
        workflow
    }

    /// Rebuild from a stored case and its encounter log. Usage is
    /// recomputed from the log, never taken from the snapshot.
    pub fn from_parts(mut case: Case, activities: &[OngoingManagementActivity]) -> Self {
        let mut ledger = BasketLedger::from_snapshot(std::mem::take(&mut case.selected_treatments));
        ledger.replay(activities);
        case.selected_treatments = ledger.items().to_vec();

        let note_related = !case.detected_conditions.is_empty() || case.confirmed_condition.is_some();

        Self {
            stored: Some(case.clone()),
            case,
            ledger,
            note_related,
            encounter: None,
        }
    }

    /// Load a case and replay its encounters.
    pub fn open(store: &dyn CaseStore, case_id: Uuid) -> Result<Self, ClaimError> {
        let case = store
            .load_case(&case_id)?
            .ok_or(ClaimError::CaseNotFound(case_id))?;
        let activities = store.list_activities(&case_id)?;
        tracing::debug!(%case_id, activities = activities.len(), "Case opened");
        Ok(Self::from_parts(case, &activities))
    }

    pub fn case(&self) -> &Case {
        &self.case
    }

    pub fn id(&self) -> Uuid {
        self.case.id
    }

    pub fn step(&self) -> WorkflowStep {
        self.case.current_step
    }

    pub fn ledger(&self) -> &BasketLedger {
        &self.ledger
    }

    pub fn encounter(&self) -> Option<&EncounterDraft> {
        self.encounter.as_ref()
    }

    pub fn ongoing_skipped(&self) -> bool {
        self.case.ongoing_skipped
    }

    /// True when reopening from the store would give back this exact
    /// workflow: no open encounter and no edits since the last save.
    pub fn is_clean(&self) -> bool {
        self.encounter.is_none() && self.stored.as_ref() == Some(&self.case)
    }

    pub fn view(&self) -> CaseView {
        CaseView {
            case: self.case.clone(),
            encounter: self.encounter.clone(),
            usage_log: self.ledger.log().to_vec(),
        }
    }

    // ── Note and condition ──────────────────────────────────

    /// Run detection on a new note. On any detection error nothing changes.
    pub fn enter_note(
        &mut self,
        note: &str,
        detector: &ConditionDetector,
    ) -> Result<Vec<ConditionMatch>, ClaimError> {
        self.ensure_step("enter a note", WorkflowStep::NoteEntry)?;
        let matches = detector.analyze(note)?;
        let detected: Vec<String> = matches.iter().map(|m| m.condition.clone()).collect();

        let keeps_condition = match &self.case.confirmed_condition {
            Some(current) => detected.iter().any(|d| d.eq_ignore_ascii_case(current)),
            None => true,
        };
        if !keeps_condition {
            self.ensure_no_usage("replace the note")?;
            self.clear_condition();
        }

        self.case.patient_note = note.trim().to_string();
        self.case.detected_conditions = detected;
        self.note_related = true;
        self.touch();

        tracing::info!(
            case_id = %self.case.id,
            candidates = matches.len(),
            top = matches.first().map(|m| m.condition.as_str()).unwrap_or(""),
            "Note analyzed"
        );
        Ok(matches)
    }

    /// Pick one of the detected candidates. Switching to a different
    /// condition drops codes, baskets and medicines.
    pub fn choose_condition(&mut self, name: &str, catalog: &ReferenceCatalog) -> Result<(), ClaimError> {
        self.ensure_step("choose a condition", WorkflowStep::NoteEntry)?;
        if !self
            .case
            .detected_conditions
            .iter()
            .any(|d| d.eq_ignore_ascii_case(name))
        {
            return Err(ClaimError::ConditionNotDetected(name.to_string()));
        }
        let canonical = catalog
            .canonical_name(name)
            .ok_or_else(|| ClaimError::UnknownCondition(name.to_string()))?
            .to_string();

        if self.case.confirmed_condition.as_deref() == Some(canonical.as_str()) {
            return Ok(());
        }
        if self.case.confirmed_condition.is_some() {
            self.ensure_no_usage("change the condition")?;
            self.clear_condition();
        }

        tracing::info!(case_id = %self.case.id, condition = %canonical, "Condition chosen");
        self.case.confirmed_condition = Some(canonical);
        self.touch();
        Ok(())
    }

    pub fn toggle_icd_code(&mut self, icd_code: &str, catalog: &ReferenceCatalog) -> Result<SelectionChange, ClaimError> {
        self.ensure_editable("change ICD codes", WorkflowStep::ConditionConfirmed)?;
        let condition = self.confirmed_condition()?;
        let code = catalog
            .find_icd(&condition, icd_code)
            .ok_or_else(|| ClaimError::UnknownIcdCode(icd_code.to_string()))?
            .clone();

        let change = if let Some(pos) = self
            .case
            .selected_icd_codes
            .iter()
            .position(|c| c.icd_code == code.icd_code)
        {
            self.case.selected_icd_codes.remove(pos);
            SelectionChange::Removed
        } else {
            self.case.selected_icd_codes.push(code);
            SelectionChange::Added
        };
        self.touch();
        Ok(change)
    }

    // ── Baskets ─────────────────────────────────────────────

    pub fn toggle_basket_item(
        &mut self,
        basket_type: BasketType,
        code: &str,
        catalog: &ReferenceCatalog,
    ) -> Result<SelectionChange, ClaimError> {
        self.ensure_editable("change basket items", WorkflowStep::CodesSelected)?;
        let condition = self.confirmed_condition()?;
        let def = catalog
            .find_basket_item(&condition, basket_type, code)
            .ok_or_else(|| ClaimError::UnknownItem {
                basket_type,
                code: code.to_string(),
            })?;

        let change = self.ledger.select(def, basket_type);
        if basket_type == BasketType::Ongoing && change == SelectionChange::Added {
            self.case.ongoing_skipped = false;
        }
        self.sync_treatments();
        Ok(change)
    }

    pub fn set_quantity(&mut self, basket_type: BasketType, code: &str, quantity: i64) -> Result<u32, ClaimError> {
        self.ensure_editable("change quantities", WorkflowStep::CodesSelected)?;
        let stored = self.ledger.set_quantity(basket_type, code, quantity)?;
        self.sync_treatments();
        Ok(stored)
    }

    pub fn document_item(
        &mut self,
        basket_type: BasketType,
        code: &str,
        note: &str,
        files: Vec<StoredAttachment>,
    ) -> Result<(), ClaimError> {
        self.ensure_editable("document basket items", WorkflowStep::CodesSelected)?;
        self.ledger.document(
            basket_type,
            code,
            ItemDocumentation {
                note: note.trim().to_string(),
                files,
                timestamp: Utc::now(),
            },
        )?;
        self.sync_treatments();
        Ok(())
    }

    /// Explicitly skip the ongoing management basket and move on.
    pub fn skip_ongoing(&mut self) -> Result<WorkflowStep, ClaimError> {
        self.ensure_not_locked("skip ongoing management")?;
        if self.case.current_step != WorkflowStep::OngoingBasket {
            return Err(self.invalid("skip ongoing management"));
        }
        self.case.ongoing_skipped = true;
        self.advance()
    }

    /// Selected ongoing items that another encounter may still consume.
    pub fn admissible_items(&self) -> Vec<SelectedBasketItem> {
        self.ledger.admissible_items().into_iter().cloned().collect()
    }

    // ── Medicines and plan ──────────────────────────────────

    /// Toggle a medicine. Removal is always allowed; adding one excluded
    /// under the active plan is not.
    pub fn toggle_medicine(&mut self, name_strength: &str, catalog: &ReferenceCatalog) -> Result<SelectionChange, ClaimError> {
        self.ensure_editable("change medicines", WorkflowStep::CodesSelected)?;
        let condition = self.confirmed_condition()?;
        let medicine = catalog
            .find_medicine(&condition, name_strength)
            .ok_or_else(|| ClaimError::UnknownMedicine(name_strength.to_string()))?;

        if let Some(pos) = self
            .case
            .selected_medications
            .iter()
            .position(|m| m.medicine_name_strength == medicine.medicine_name_strength)
        {
            self.case.selected_medications.remove(pos);
            self.touch();
            return Ok(SelectionChange::Removed);
        }

        let plan = self.case.active_plan;
        if !medicine.is_available_under(plan) {
            return Err(ClaimError::PlanIncompatible {
                medicine: medicine.medicine_name_strength.clone(),
                plan,
            });
        }
        self.case.selected_medications.push(medicine.clone());
        self.touch();
        Ok(SelectionChange::Added)
    }

    /// Switch the active plan. Selections are kept; availability is
    /// re-evaluated by `medicine_availability` and the finalize guard.
    pub fn set_plan(&mut self, plan: Plan) -> Result<(), ClaimError> {
        self.ensure_editable("change the plan", WorkflowStep::NoteEntry)?;
        if self.case.active_plan != plan {
            tracing::info!(case_id = %self.case.id, from = %self.case.active_plan, to = %plan, "Plan changed");
            self.case.active_plan = plan;
            self.touch();
        }
        Ok(())
    }

    pub fn medicine_availability(&self, catalog: &ReferenceCatalog) -> Vec<MedicineAvailability> {
        let Some(condition) = self.case.confirmed_condition.as_deref() else {
            return Vec::new();
        };
        let plan = self.case.active_plan;
        catalog
            .medicines_for(condition)
            .into_iter()
            .map(|medicine| {
                let selected = self
                    .case
                    .selected_medications
                    .iter()
                    .any(|m| m.medicine_name_strength == medicine.medicine_name_strength);
                MedicineAvailability {
                    available: medicine.is_available_under(plan),
                    selected,
                    medicine,
                }
            })
            .collect()
    }

    pub fn add_registration_note(&mut self, body: &str) -> Result<(), ClaimError> {
        self.ensure_not_locked("add a registration note")?;
        let body = body.trim();
        if body.is_empty() {
            return Err(ClaimError::EmptyNote);
        }
        self.case.chronic_registration_notes.push(RegistrationNote {
            body: body.to_string(),
            created_at: Utc::now(),
        });
        self.touch();
        Ok(())
    }

    // ── Navigation ──────────────────────────────────────────

    /// Move to the next step if the current step's guard holds.
    pub fn advance(&mut self) -> Result<WorkflowStep, ClaimError> {
        self.ensure_not_locked("advance")?;
        let from = self.case.current_step;
        let next = from.next().ok_or_else(|| self.invalid("advance"))?;
        self.check_guard(from)?;

        self.case.current_step = next;
        if next == WorkflowStep::Finalized {
            self.finalize();
        }
        self.touch();
        tracing::info!(case_id = %self.case.id, %from, to = %next, "Workflow advanced");
        Ok(next)
    }

    /// Step back without discarding anything. Leaving `Finalized` reopens
    /// the case.
    pub fn previous_step(&mut self) -> Result<WorkflowStep, ClaimError> {
        self.ensure_not_locked("go back")?;
        let from = self.case.current_step;
        let Some(prev) = from.previous() else {
            return Ok(from);
        };
        if from == WorkflowStep::Finalized {
            self.case.status = CaseStatus::Active;
        }
        self.case.current_step = prev;
        self.touch();
        tracing::debug!(case_id = %self.case.id, %from, to = %prev, "Workflow stepped back");
        Ok(prev)
    }

    fn check_guard(&self, step: WorkflowStep) -> Result<(), ClaimError> {
        match step {
            WorkflowStep::NoteEntry => {
                if self.case.patient_note.trim().is_empty() {
                    return Err(ClaimError::EmptyNote);
                }
                if !self.note_related {
                    return Err(ClaimError::OutOfDomainNote);
                }
                if self.case.confirmed_condition.is_none() {
                    return Err(ClaimError::IncompleteSelection(Guard::ConditionNotChosen));
                }
            }
            WorkflowStep::ConditionConfirmed => {
                if self.case.selected_icd_codes.is_empty() {
                    return Err(ClaimError::IncompleteSelection(Guard::NoIcdCodes));
                }
            }
            WorkflowStep::CodesSelected => {
                let mut items = self.ledger.items_in(BasketType::Diagnostic).peekable();
                if items.peek().is_none() {
                    return Err(ClaimError::IncompleteSelection(Guard::NoDiagnosticItems));
                }
                if let Some(bad) = items.find(|i| !i.has_valid_quantity()) {
                    return Err(ClaimError::IncompleteSelection(Guard::DiagnosticQuantity(bad.code.clone())));
                }
            }
            WorkflowStep::DiagnosticBasket => {}
            WorkflowStep::OngoingBasket => {
                if !self.case.ongoing_skipped {
                    let mut items = self.ledger.items_in(BasketType::Ongoing).peekable();
                    if items.peek().is_none() {
                        return Err(ClaimError::IncompleteSelection(Guard::NoOngoingItems));
                    }
                    if let Some(bad) = items.find(|i| !i.has_valid_quantity()) {
                        return Err(ClaimError::IncompleteSelection(Guard::OngoingQuantity(bad.code.clone())));
                    }
                }
            }
            WorkflowStep::MedicationsSelected => {
                if self.case.selected_medications.is_empty() {
                    return Err(ClaimError::IncompleteSelection(Guard::NoMedicines));
                }
                let plan = self.case.active_plan;
                if let Some(m) = self
                    .case
                    .selected_medications
                    .iter()
                    .find(|m| !m.is_available_under(plan))
                {
                    return Err(ClaimError::PlanIncompatible {
                        medicine: m.medicine_name_strength.clone(),
                        plan,
                    });
                }
            }
            WorkflowStep::Finalized => return Err(self.invalid("advance")),
        }
        Ok(())
    }

    fn finalize(&mut self) {
        if self.case.chronic_registration_notes.is_empty() {
            let body = compose_registration_note(&self.case);
            self.case.chronic_registration_notes.push(RegistrationNote {
                body,
                created_at: Utc::now(),
            });
        }
        self.case.status = CaseStatus::Completed;
        tracing::info!(case_id = %self.case.id, "Case finalized");
    }

    // ── Save points ─────────────────────────────────────────

    /// Persist the case. On failure the workflow is left exactly as it was.
    /// An open encounter is not persisted; the stored step is the one the
    /// encounter will return to.
    pub fn save(&mut self, store: &dyn CaseStore) -> Result<(), ClaimError> {
        let mut snapshot = self.case.clone();
        snapshot.updated_at = Utc::now();
        if let Some(draft) = &self.encounter {
            snapshot.current_step = draft.return_to;
        }
        store.save_case(&snapshot)?;
        self.case.updated_at = snapshot.updated_at;
        self.stored = Some(snapshot);
        Ok(())
    }

    pub fn archive(&mut self, store: &dyn CaseStore) -> Result<(), ClaimError> {
        if self.encounter.is_some() {
            return Err(self.invalid("archive"));
        }
        if self.case.status == CaseStatus::Archived {
            return Ok(());
        }
        let mut snapshot = self.case.clone();
        snapshot.status = CaseStatus::Archived;
        snapshot.updated_at = Utc::now();
        store.save_case(&snapshot)?;
        self.stored = Some(snapshot.clone());
        self.case = snapshot;
        tracing::info!(case_id = %self.case.id, "Case archived");
        Ok(())
    }

    // ── Encounters ──────────────────────────────────────────

    /// Enter ongoing-management mode for a follow-up encounter.
    pub fn begin_encounter(&mut self, details: EncounterDetails) -> Result<&EncounterDraft, ClaimError> {
        if self.case.status == CaseStatus::Archived || self.encounter.is_some() {
            return Err(self.invalid("begin an encounter"));
        }
        if self.case.confirmed_condition.is_none() {
            return Err(ClaimError::IncompleteSelection(Guard::ConditionNotChosen));
        }
        if self.ledger.items_in(BasketType::Ongoing).next().is_none() {
            return Err(ClaimError::IncompleteSelection(Guard::NoOngoingItems));
        }

        let draft = EncounterDraft {
            activity_id: Uuid::new_v4(),
            activity_type: details.activity_type,
            activity_date: details.activity_date,
            specialist_type: details
                .specialist_type
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            clinical_notes: details.clinical_notes.trim().to_string(),
            codes: Vec::new(),
            return_to: self.case.current_step,
        };
        tracing::info!(case_id = %self.case.id, activity_id = %draft.activity_id, "Encounter started");
        self.case.current_step = WorkflowStep::OngoingBasket;
        let draft = self.encounter.insert(draft);
        Ok(&*draft)
    }

    /// Add or remove a code on the open encounter. Only admissible codes can
    /// be added.
    pub fn toggle_encounter_code(&mut self, code: &str) -> Result<SelectionChange, ClaimError> {
        let Some(draft) = self.encounter.as_ref() else {
            return Err(self.invalid("select encounter items"));
        };
        if let Some(pos) = draft.codes.iter().position(|c| c == code) {
            if let Some(draft) = self.encounter.as_mut() {
                draft.codes.remove(pos);
            }
            return Ok(SelectionChange::Removed);
        }

        self.ledger.check_admissible(code)?;
        if let Some(draft) = self.encounter.as_mut() {
            draft.codes.push(code.to_string());
        }
        Ok(SelectionChange::Added)
    }

    /// Record the encounter: apply usage, then store the activity and the
    /// updated case together and return to the remembered step. If the store
    /// write fails nothing is recorded, and the ledger, case and draft are
    /// unchanged so the call can be retried or the encounter cancelled.
    pub fn complete_encounter(
        &mut self,
        store: &dyn CaseStore,
        created_by: &str,
    ) -> Result<CompletedEncounter, ClaimError> {
        let draft = self
            .encounter
            .clone()
            .ok_or_else(|| self.invalid("complete an encounter"))?;
        if draft.codes.is_empty() {
            return Err(ClaimError::IncompleteSelection(Guard::NoEncounterCodes));
        }
        if draft.activity_type == ActivityType::SpecialistVisit && draft.specialist_type.is_none() {
            return Err(ClaimError::IncompleteSelection(Guard::NoSpecialistType));
        }

        let created_at = Utc::now();
        let mut ledger = self.ledger.clone();
        let outcome = ledger.record_encounter_usage(
            EncounterKey {
                activity_id: draft.activity_id,
                activity_date: draft.activity_date,
                created_at,
            },
            &draft.codes,
        );
        if outcome.accepted.is_empty() {
            let err = match outcome.rejected.first() {
                Some(r) => self
                    .ledger
                    .check_admissible(&r.code)
                    .err()
                    .unwrap_or_else(|| ClaimError::NotSelected(r.code.clone())),
                None => ClaimError::IncompleteSelection(Guard::NoEncounterCodes),
            };
            return Err(err);
        }

        let attachments = outcome
            .accepted
            .iter()
            .filter_map(|code| ledger.get(BasketType::Ongoing, code))
            .map(|item| ActivityAttachment {
                code: item.code.clone(),
                description: item.description.clone(),
                usage_count: item.usage_count,
            })
            .collect();
        let activity = OngoingManagementActivity {
            id: draft.activity_id,
            case_id: self.case.id,
            activity_type: draft.activity_type,
            activity_date: draft.activity_date,
            specialist_type: draft.specialist_type.clone(),
            clinical_notes: draft.clinical_notes.clone(),
            attachments,
            created_by: created_by.to_string(),
            created_at,
        };

        let mut snapshot = self.case.clone();
        snapshot.selected_treatments = ledger.items().to_vec();
        snapshot.current_step = draft.return_to;
        snapshot.updated_at = created_at;

        store.record_encounter(&activity, &snapshot)?;

        self.ledger = ledger;
        self.stored = Some(snapshot.clone());
        self.case = snapshot;
        self.encounter = None;
        tracing::info!(
            case_id = %self.case.id,
            activity_id = %activity.id,
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "Encounter completed"
        );
        Ok(CompletedEncounter { activity, outcome })
    }

    /// Leave encounter mode without recording anything.
    pub fn cancel_encounter(&mut self) -> Result<(), ClaimError> {
        let draft = self
            .encounter
            .take()
            .ok_or_else(|| self.invalid("cancel an encounter"))?;
        self.case.current_step = draft.return_to;
        tracing::debug!(case_id = %self.case.id, activity_id = %draft.activity_id, "Encounter cancelled");
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────

    fn confirmed_condition(&self) -> Result<String, ClaimError> {
        self.case
            .confirmed_condition
            .clone()
            .ok_or(ClaimError::IncompleteSelection(Guard::ConditionNotChosen))
    }

    fn clear_condition(&mut self) {
        self.case.confirmed_condition = None;
        self.case.selected_icd_codes.clear();
        self.case.selected_medications.clear();
        self.ledger = BasketLedger::new();
        self.case.ongoing_skipped = false;
        self.sync_treatments();
    }

    fn ensure_no_usage(&self, action: &'static str) -> Result<(), ClaimError> {
        if self.ledger.log().is_empty() {
            Ok(())
        } else {
            Err(ClaimError::InvalidTransition {
                action,
                state: "encounters are recorded".into(),
            })
        }
    }

    /// Archived cases and cases with an open encounter accept no edits.
    fn ensure_not_locked(&self, action: &'static str) -> Result<(), ClaimError> {
        if self.case.status == CaseStatus::Archived || self.encounter.is_some() {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    fn ensure_step(&self, action: &'static str, step: WorkflowStep) -> Result<(), ClaimError> {
        self.ensure_not_locked(action)?;
        if self.case.current_step != step {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    /// Editable between `from` and finalization.
    fn ensure_editable(&self, action: &'static str, from: WorkflowStep) -> Result<(), ClaimError> {
        self.ensure_not_locked(action)?;
        let step = self.case.current_step;
        if step == WorkflowStep::Finalized || step.index() < from.index() {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> ClaimError {
        let state = if self.case.status == CaseStatus::Archived {
            "archived".to_string()
        } else if self.encounter.is_some() {
            "an encounter is open".to_string()
        } else {
            format!("at step {}", self.case.current_step)
        };
        ClaimError::InvalidTransition { action, state }
    }

    fn sync_treatments(&mut self) {
        self.case.selected_treatments = self.ledger.items().to_vec();
        self.touch();
    }

    fn touch(&mut self) {
        self.case.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseError, SqliteCaseStore};
    use crate::models::{Patient, ReferralLetter};

    const DI_NOTE: &str =
        "Patient reports polyuria, polydipsia, and excessive thirst, started on desmopressin";

    /// Store whose every call fails.
    struct FailingStore;

    impl CaseStore for FailingStore {
        fn save_patient(&self, _: &Patient) -> Result<(), DatabaseError> {
            Err(DatabaseError::Unavailable("disk full".into()))
        }
        fn load_patient(&self, _: &Uuid) -> Result<Option<Patient>, DatabaseError> {
            Err(DatabaseError::Unavailable("disk full".into()))
        }
        fn list_patients(&self) -> Result<Vec<Patient>, DatabaseError> {
            Err(DatabaseError::Unavailable("disk full".into()))
        }
        fn save_case(&self, _: &Case) -> Result<(), DatabaseError> {
            Err(DatabaseError::Unavailable("disk full".into()))
        }
        fn load_case(&self, _: &Uuid) -> Result<Option<Case>, DatabaseError> {
            Err(DatabaseError::Unavailable("disk full".into()))
        }
        fn list_cases(&self, _: &Uuid) -> Result<Vec<Case>, DatabaseError> {
            Err(DatabaseError::Unavailable("disk full".into()))
        }
        fn delete_case(&self, _: &Uuid) -> Result<(), DatabaseError> {
            Err(DatabaseError::Unavailable("disk full".into()))
        }
        fn record_encounter(&self, _: &OngoingManagementActivity, _: &Case) -> Result<bool, DatabaseError> {
            Err(DatabaseError::Unavailable("disk full".into()))
        }
        fn list_activities(&self, _: &Uuid) -> Result<Vec<OngoingManagementActivity>, DatabaseError> {
            Err(DatabaseError::Unavailable("disk full".into()))
        }
        fn save_referral(&self, _: &ReferralLetter) -> Result<(), DatabaseError> {
            Err(DatabaseError::Unavailable("disk full".into()))
        }
        fn load_referral(&self, _: &Uuid) -> Result<Option<ReferralLetter>, DatabaseError> {
            Err(DatabaseError::Unavailable("disk full".into()))
        }
        fn list_referrals(&self, _: &Uuid) -> Result<Vec<ReferralLetter>, DatabaseError> {
            Err(DatabaseError::Unavailable("disk full".into()))
        }
    }

    struct Fixture {
        catalog: ReferenceCatalog,
        detector: ConditionDetector,
        store: SqliteCaseStore,
        patient: Patient,
    }

    fn fixture(plan: Plan) -> Fixture {
        let catalog = ReferenceCatalog::load_test();
        let detector = ConditionDetector::from_catalog(&catalog);
        let store = SqliteCaseStore::open_in_memory().unwrap();
        let patient = Patient::new("Themba Nkosi", plan);
        store.save_patient(&patient).unwrap();
        Fixture {
            catalog,
            detector,
            store,
            patient,
        }
    }

    fn at_codes_selected(fx: &Fixture) -> CaseWorkflow {
        let mut wf = CaseWorkflow::start(fx.patient.id, fx.patient.plan);
        wf.enter_note(DI_NOTE, &fx.detector).unwrap();
        wf.choose_condition("Diabetes Insipidus", &fx.catalog).unwrap();
        wf.advance().unwrap();
        wf.toggle_icd_code("E23.2", &fx.catalog).unwrap();
        wf.advance().unwrap();
        wf
    }

    fn at_medicines(fx: &Fixture) -> CaseWorkflow {
        let mut wf = at_codes_selected(fx);
        wf.toggle_basket_item(BasketType::Diagnostic, "4171", &fx.catalog).unwrap();
        wf.set_quantity(BasketType::Diagnostic, "4171", 2).unwrap();
        wf.advance().unwrap();
        wf.advance().unwrap();
        wf.toggle_basket_item(BasketType::Ongoing, "4032", &fx.catalog).unwrap();
        wf.set_quantity(BasketType::Ongoing, "4032", 2).unwrap();
        wf.advance().unwrap();
        wf
    }

    fn finalized(fx: &Fixture) -> CaseWorkflow {
        let mut wf = at_medicines(fx);
        wf.toggle_medicine("Minirin 0.1mg", &fx.catalog).unwrap();
        wf.advance().unwrap();
        wf.save(&fx.store).unwrap();
        wf
    }

    fn follow_up() -> EncounterDetails {
        EncounterDetails {
            activity_type: ActivityType::FollowUp,
            activity_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            specialist_type: None,
            clinical_notes: "Electrolytes stable".into(),
        }
    }

    #[test]
    fn full_build_reaches_finalized_and_completed() {
        let fx = fixture(Plan::Comprehensive);
        let wf = finalized(&fx);

        assert_eq!(wf.step(), WorkflowStep::Finalized);
        assert_eq!(wf.case().status, CaseStatus::Completed);
        let note = &wf.case().latest_registration_note().unwrap().body;
        assert!(note.contains("Diabetes Insipidus"));
        assert!(note.contains("Minirin 0.1mg"));
    }

    #[test]
    fn saved_case_reopens_where_it_was() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = at_medicines(&fx);
        wf.save(&fx.store).unwrap();

        let reopened = CaseWorkflow::open(&fx.store, wf.id()).unwrap();
        assert_eq!(reopened.case(), wf.case());
        assert_eq!(reopened.step(), WorkflowStep::MedicationsSelected);
    }

    #[test]
    fn unknown_case_is_not_found() {
        let fx = fixture(Plan::Core);
        let id = Uuid::new_v4();
        assert_eq!(CaseWorkflow::open(&fx.store, id).unwrap_err(), ClaimError::CaseNotFound(id));
    }

    #[test]
    fn note_entry_requires_chosen_condition() {
        let fx = fixture(Plan::Core);
        let mut wf = CaseWorkflow::start(fx.patient.id, Plan::Core);
        assert_eq!(wf.advance(), Err(ClaimError::EmptyNote));

        wf.enter_note(DI_NOTE, &fx.detector).unwrap();
        assert_eq!(
            wf.advance(),
            Err(ClaimError::IncompleteSelection(Guard::ConditionNotChosen))
        );
        assert_eq!(wf.step(), WorkflowStep::NoteEntry);
    }

    #[test]
    fn out_of_domain_note_changes_nothing() {
        let fx = fixture(Plan::Core);
        let mut wf = CaseWorkflow::start(fx.patient.id, Plan::Core);
        let before = wf.case().clone();
        assert_eq!(
            wf.enter_note("Lunch order: two pizzas", &fx.detector),
            Err(ClaimError::OutOfDomainNote)
        );
        assert_eq!(wf.case(), &before);
    }

    #[test]
    fn only_detected_conditions_can_be_chosen() {
        let fx = fixture(Plan::Core);
        let mut wf = CaseWorkflow::start(fx.patient.id, Plan::Core);
        wf.enter_note(DI_NOTE, &fx.detector).unwrap();
        assert_eq!(
            wf.choose_condition("Hypertension", &fx.catalog),
            Err(ClaimError::ConditionNotDetected("Hypertension".into()))
        );
        wf.choose_condition("diabetes insipidus", &fx.catalog).unwrap();
        assert_eq!(wf.case().confirmed_condition.as_deref(), Some("Diabetes Insipidus"));
    }

    #[test]
    fn icd_codes_must_belong_to_condition() {
        let fx = fixture(Plan::Core);
        let mut wf = CaseWorkflow::start(fx.patient.id, Plan::Core);
        wf.enter_note(DI_NOTE, &fx.detector).unwrap();
        wf.choose_condition("Diabetes Insipidus", &fx.catalog).unwrap();
        wf.advance().unwrap();

        assert_eq!(
            wf.toggle_icd_code("I10", &fx.catalog),
            Err(ClaimError::UnknownIcdCode("I10".into()))
        );
        assert_eq!(
            wf.advance(),
            Err(ClaimError::IncompleteSelection(Guard::NoIcdCodes))
        );
    }

    #[test]
    fn diagnostic_items_need_valid_quantity() {
        let fx = fixture(Plan::Core);
        let mut wf = at_codes_selected(&fx);
        assert_eq!(
            wf.advance(),
            Err(ClaimError::IncompleteSelection(Guard::NoDiagnosticItems))
        );

        wf.toggle_basket_item(BasketType::Diagnostic, "4171", &fx.catalog).unwrap();
        assert_eq!(
            wf.advance(),
            Err(ClaimError::IncompleteSelection(Guard::DiagnosticQuantity("4171".into())))
        );

        assert!(matches!(
            wf.set_quantity(BasketType::Diagnostic, "4171", 5),
            Err(ClaimError::InvalidQuantity { limit: 4, .. })
        ));
        assert_eq!(wf.case().selected_treatments[0].selected_quantity, 0);

        wf.set_quantity(BasketType::Diagnostic, "4171", 4).unwrap();
        assert_eq!(wf.advance(), Ok(WorkflowStep::DiagnosticBasket));
    }

    #[test]
    fn ongoing_basket_can_be_skipped() {
        let fx = fixture(Plan::Core);
        let mut wf = at_codes_selected(&fx);
        wf.toggle_basket_item(BasketType::Diagnostic, "4032", &fx.catalog).unwrap();
        wf.set_quantity(BasketType::Diagnostic, "4032", 1).unwrap();
        wf.advance().unwrap();
        wf.advance().unwrap();

        assert_eq!(
            wf.advance(),
            Err(ClaimError::IncompleteSelection(Guard::NoOngoingItems))
        );
        assert_eq!(wf.skip_ongoing(), Ok(WorkflowStep::MedicationsSelected));
        assert!(wf.ongoing_skipped());
    }

    #[test]
    fn plan_exclusion_blocks_medicine_until_plan_changes() {
        let fx = fixture(Plan::KeyCare);
        let mut wf = at_medicines(&fx);
        wf.toggle_medicine("Minirin 0.1mg", &fx.catalog).unwrap();

        assert_eq!(
            wf.toggle_medicine("Desmopressin Teva 0.2mg", &fx.catalog),
            Err(ClaimError::PlanIncompatible {
                medicine: "Desmopressin Teva 0.2mg".into(),
                plan: Plan::KeyCare,
            })
        );
        let availability = wf.medicine_availability(&fx.catalog);
        assert!(!availability.iter().find(|a| a.medicine.medicine_name_strength == "Desmopressin Teva 0.2mg").unwrap().available);

        wf.set_plan(Plan::Comprehensive).unwrap();
        wf.toggle_medicine("Desmopressin Teva 0.2mg", &fx.catalog).unwrap();
        assert_eq!(wf.case().selected_medications.len(), 2);
        assert_eq!(wf.case().selected_icd_codes.len(), 1);
        assert_eq!(wf.ledger().items().len(), 2);

        // Switching back keeps the selection but finalization refuses it.
        wf.set_plan(Plan::KeyCare).unwrap();
        assert_eq!(wf.case().selected_medications.len(), 2);
        assert!(matches!(wf.advance(), Err(ClaimError::PlanIncompatible { .. })));

        // Removal is always allowed.
        wf.toggle_medicine("Desmopressin Teva 0.2mg", &fx.catalog).unwrap();
        assert_eq!(wf.advance(), Ok(WorkflowStep::Finalized));
    }

    #[test]
    fn medicines_required_to_finalize() {
        let fx = fixture(Plan::Core);
        let mut wf = at_medicines(&fx);
        assert_eq!(
            wf.advance(),
            Err(ClaimError::IncompleteSelection(Guard::NoMedicines))
        );
    }

    #[test]
    fn previous_step_is_non_destructive_and_reopens() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = finalized(&fx);

        assert_eq!(wf.previous_step(), Ok(WorkflowStep::MedicationsSelected));
        assert_eq!(wf.case().status, CaseStatus::Active);
        assert_eq!(wf.case().selected_medications.len(), 1);

        let mut fresh = CaseWorkflow::start(fx.patient.id, Plan::Core);
        assert_eq!(fresh.previous_step(), Ok(WorkflowStep::NoteEntry));
    }

    #[test]
    fn finalized_case_rejects_edits() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = finalized(&fx);
        assert!(matches!(
            wf.toggle_basket_item(BasketType::Ongoing, "0190", &fx.catalog),
            Err(ClaimError::InvalidTransition { .. })
        ));
        assert!(matches!(wf.advance(), Err(ClaimError::InvalidTransition { .. })));
    }

    #[test]
    fn registration_note_written_by_clinician_is_kept() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = at_medicines(&fx);
        wf.toggle_medicine("Minirin 0.1mg", &fx.catalog).unwrap();
        assert_eq!(wf.add_registration_note("  "), Err(ClaimError::EmptyNote));
        wf.add_registration_note("Registered for DI, water deprivation confirmed").unwrap();
        wf.advance().unwrap();

        assert_eq!(wf.case().chronic_registration_notes.len(), 1);
        assert_eq!(
            wf.case().latest_registration_note().unwrap().body,
            "Registered for DI, water deprivation confirmed"
        );
    }

    #[test]
    fn encounters_consume_up_to_limit_and_restore_step() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = finalized(&fx);

        for expected in 1..=2 {
            wf.begin_encounter(follow_up()).unwrap();
            assert_eq!(wf.step(), WorkflowStep::OngoingBasket);
            wf.toggle_encounter_code("4032").unwrap();
            let done = wf.complete_encounter(&fx.store, "dr.naidoo").unwrap();
            assert_eq!(done.outcome.accepted, vec!["4032".to_string()]);
            assert_eq!(done.activity.attachments[0].usage_count, expected);
            assert_eq!(wf.step(), WorkflowStep::Finalized);
        }

        wf.begin_encounter(follow_up()).unwrap();
        assert_eq!(
            wf.toggle_encounter_code("4032"),
            Err(ClaimError::CoverageLimitReached {
                code: "4032".into(),
                usage: 2,
                limit: 2,
            })
        );
        assert!(wf.admissible_items().is_empty());
        wf.cancel_encounter().unwrap();
        assert_eq!(wf.step(), WorkflowStep::Finalized);
        assert_eq!(wf.ledger().usage_count("4032"), 2);
    }

    #[test]
    fn reopening_replays_usage_from_activities() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = finalized(&fx);
        wf.begin_encounter(follow_up()).unwrap();
        wf.toggle_encounter_code("4032").unwrap();
        wf.complete_encounter(&fx.store, "dr.naidoo").unwrap();

        let reopened = CaseWorkflow::open(&fx.store, wf.id()).unwrap();
        assert_eq!(reopened.ledger().usage_count("4032"), 1);
        assert_eq!(
            reopened.case().selected_treatments,
            wf.case().selected_treatments
        );
        assert_eq!(fx.store.list_activities(&wf.id()).unwrap().len(), 1);
    }

    #[test]
    fn encounter_needs_codes_and_specialist() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = finalized(&fx);

        wf.begin_encounter(follow_up()).unwrap();
        assert_eq!(
            wf.complete_encounter(&fx.store, "dr.naidoo").unwrap_err(),
            ClaimError::IncompleteSelection(Guard::NoEncounterCodes)
        );
        wf.cancel_encounter().unwrap();

        wf.begin_encounter(EncounterDetails {
            activity_type: ActivityType::SpecialistVisit,
            specialist_type: Some("  ".into()),
            ..follow_up()
        })
        .unwrap();
        wf.toggle_encounter_code("4032").unwrap();
        assert_eq!(
            wf.complete_encounter(&fx.store, "dr.naidoo").unwrap_err(),
            ClaimError::IncompleteSelection(Guard::NoSpecialistType)
        );
    }

    #[test]
    fn encounter_requires_ongoing_items() {
        let fx = fixture(Plan::Core);
        let mut wf = at_codes_selected(&fx);
        assert_eq!(
            wf.begin_encounter(follow_up()).unwrap_err(),
            ClaimError::IncompleteSelection(Guard::NoOngoingItems)
        );
    }

    #[test]
    fn edits_are_locked_during_encounter() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = at_medicines(&fx);
        wf.begin_encounter(follow_up()).unwrap();
        assert!(matches!(
            wf.toggle_medicine("Minirin 0.1mg", &fx.catalog),
            Err(ClaimError::InvalidTransition { .. })
        ));
        assert!(matches!(wf.begin_encounter(follow_up()), Err(ClaimError::InvalidTransition { .. })));
    }

    #[test]
    fn condition_is_fixed_once_encounters_exist() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = finalized(&fx);
        wf.begin_encounter(follow_up()).unwrap();
        wf.toggle_encounter_code("4032").unwrap();
        wf.complete_encounter(&fx.store, "dr.naidoo").unwrap();

        while wf.step() != WorkflowStep::NoteEntry {
            wf.previous_step().unwrap();
        }
        let note = "Patient with hypertension and polyuria";
        wf.enter_note(note, &fx.detector).unwrap();
        assert!(matches!(
            wf.enter_note("Known hypertension, on amlodipine", &fx.detector),
            Err(ClaimError::InvalidTransition { .. })
        ));
        assert!(matches!(
            wf.choose_condition("Hypertension", &fx.catalog),
            Err(ClaimError::InvalidTransition { .. })
        ));
        assert_eq!(wf.case().confirmed_condition.as_deref(), Some("Diabetes Insipidus"));
    }

    #[test]
    fn failed_save_leaves_workflow_unchanged() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = at_medicines(&fx);
        let before = wf.case().clone();

        let err = wf.save(&FailingStore).unwrap_err();
        assert!(matches!(err, ClaimError::PersistenceFailure(_)));
        assert_eq!(wf.case(), &before);

        assert!(wf.archive(&FailingStore).is_err());
        assert_eq!(wf.case().status, CaseStatus::Active);
    }

    #[test]
    fn failed_encounter_save_keeps_draft_and_usage() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = finalized(&fx);
        wf.begin_encounter(follow_up()).unwrap();
        wf.toggle_encounter_code("4032").unwrap();

        assert!(wf.complete_encounter(&FailingStore, "dr.naidoo").is_err());
        assert_eq!(wf.ledger().usage_count("4032"), 0);
        assert_eq!(wf.encounter().unwrap().codes, vec!["4032".to_string()]);

        // Retrying against a working store records exactly once.
        wf.complete_encounter(&fx.store, "dr.naidoo").unwrap();
        assert_eq!(wf.ledger().usage_count("4032"), 1);
    }

    /// Make every case write on `store` fail until the guard is dropped.
    struct RejectCaseWrites<'a>(&'a SqliteCaseStore);

    impl<'a> RejectCaseWrites<'a> {
        fn install(store: &'a SqliteCaseStore) -> Self {
            store
                .connection()
                .execute_batch(
                    "CREATE TRIGGER reject_case_insert BEFORE INSERT ON cases
                     BEGIN SELECT RAISE(ABORT, 'disk full'); END;
                     CREATE TRIGGER reject_case_update BEFORE UPDATE ON cases
                     BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
                )
                .unwrap();
            Self(store)
        }
    }

    impl Drop for RejectCaseWrites<'_> {
        fn drop(&mut self) {
            self.0
                .connection()
                .execute_batch("DROP TRIGGER reject_case_insert; DROP TRIGGER reject_case_update;")
                .unwrap();
        }
    }

    #[test]
    fn failed_case_write_records_no_usage() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = finalized(&fx);
        wf.begin_encounter(follow_up()).unwrap();
        wf.toggle_encounter_code("4032").unwrap();
        wf.complete_encounter(&fx.store, "dr.naidoo").unwrap();

        {
            let _guard = RejectCaseWrites::install(&fx.store);
            wf.begin_encounter(follow_up()).unwrap();
            wf.toggle_encounter_code("4032").unwrap();
            assert!(matches!(
                wf.complete_encounter(&fx.store, "dr.naidoo"),
                Err(ClaimError::PersistenceFailure(_))
            ));
            assert_eq!(wf.ledger().usage_count("4032"), 1);
            assert_eq!(fx.store.list_activities(&wf.id()).unwrap().len(), 1);
            wf.cancel_encounter().unwrap();
        }

        wf.begin_encounter(follow_up()).unwrap();
        wf.toggle_encounter_code("4032").unwrap();
        wf.complete_encounter(&fx.store, "dr.naidoo").unwrap();

        let reopened = CaseWorkflow::open(&fx.store, wf.id()).unwrap();
        let item = reopened.ledger().get(BasketType::Ongoing, "4032").unwrap();
        assert_eq!(item.usage_count, 2);
        assert!(item.usage_count <= item.coverage_limit);
        assert_eq!(fx.store.list_activities(&wf.id()).unwrap().len(), 2);
    }

    #[test]
    fn skip_with_ongoing_selection_survives_reopen() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = at_codes_selected(&fx);
        wf.toggle_basket_item(BasketType::Diagnostic, "4171", &fx.catalog).unwrap();
        wf.set_quantity(BasketType::Diagnostic, "4171", 1).unwrap();
        wf.advance().unwrap();
        wf.advance().unwrap();
        wf.toggle_basket_item(BasketType::Ongoing, "0190", &fx.catalog).unwrap();
        assert!(matches!(
            wf.advance(),
            Err(ClaimError::IncompleteSelection(Guard::OngoingQuantity(_)))
        ));
        wf.skip_ongoing().unwrap();
        wf.save(&fx.store).unwrap();

        let mut reopened = CaseWorkflow::open(&fx.store, wf.id()).unwrap();
        assert!(reopened.ongoing_skipped());
        assert_eq!(reopened.case().items_in(BasketType::Ongoing).count(), 1);

        // Stepping back over the skipped basket keeps the skip.
        assert_eq!(reopened.previous_step(), Ok(WorkflowStep::OngoingBasket));
        assert_eq!(reopened.advance(), Ok(WorkflowStep::MedicationsSelected));
    }

    #[test]
    fn clean_only_after_edits_are_saved() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = CaseWorkflow::start(fx.patient.id, fx.patient.plan);
        assert!(!wf.is_clean());
        wf.save(&fx.store).unwrap();
        assert!(wf.is_clean());

        wf.enter_note(DI_NOTE, &fx.detector).unwrap();
        assert!(!wf.is_clean());
        wf.save(&fx.store).unwrap();
        assert!(wf.is_clean());
        assert!(CaseWorkflow::open(&fx.store, wf.id()).unwrap().is_clean());
    }

    #[test]
    fn open_encounter_is_never_clean() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = finalized(&fx);
        assert!(wf.is_clean());
        wf.begin_encounter(follow_up()).unwrap();
        assert!(!wf.is_clean());
        wf.toggle_encounter_code("4032").unwrap();
        wf.complete_encounter(&fx.store, "dr.naidoo").unwrap();
        assert!(wf.is_clean());
    }

    #[test]
    fn archived_case_is_read_only() {
        let fx = fixture(Plan::Comprehensive);
        let mut wf = finalized(&fx);
        wf.archive(&fx.store).unwrap();

        assert_eq!(wf.case().status, CaseStatus::Archived);
        assert!(matches!(wf.previous_step(), Err(ClaimError::InvalidTransition { .. })));
        assert!(matches!(wf.begin_encounter(follow_up()), Err(ClaimError::InvalidTransition { .. })));
        let stored = fx.store.load_case(&wf.id()).unwrap().unwrap();
        assert_eq!(stored.status, CaseStatus::Archived);
    }
}
