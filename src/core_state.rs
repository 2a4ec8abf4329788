//! Application state shared by every HTTP handler.
//!
//! Holds the read-only reference catalog and detector, the case store
//! behind a `Mutex`, the attachment store, and the open case workflows.
//! Lock order is always workflows before store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, RwLock};

use uuid::Uuid;

use crate::attachments::{AttachmentStore, StorageError};
use crate::claim::{
    referral, CaseView, CaseWorkflow, ClaimDocument, ClaimError, ConditionDetector,
    ReferenceCatalog, ReferenceError,
};
use crate::config;
use crate::db::{self, CaseStore, SqliteCaseStore};
use crate::models::enums::{Plan, UrgencyLevel};
use crate::models::{Case, Patient, ReferralLetter, StoredAttachment};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

/// Cached workflows kept before clean ones are dropped.
pub const MAX_OPEN_CASES: usize = 256;

pub struct CoreState {
    catalog: ReferenceCatalog,
    detector: ConditionDetector,
    store: Mutex<SqliteCaseStore>,
    attachments: AttachmentStore,
    /// Open cases keyed by case id. Archived cases are not kept.
    workflows: RwLock<HashMap<Uuid, CaseWorkflow>>,
    workflow_capacity: usize,
}

/// Borrowed services handed to workflow operations.
pub struct Services<'a> {
    pub catalog: &'a ReferenceCatalog,
    pub detector: &'a ConditionDetector,
    pub store: &'a dyn CaseStore,
}

/// Referral status change requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralAction {
    Send,
    Acknowledge,
    Cancel,
}

impl CoreState {
    pub fn new(catalog: ReferenceCatalog, store: SqliteCaseStore, attachments: AttachmentStore) -> Self {
        let detector = ConditionDetector::from_catalog(&catalog);
        Self {
            catalog,
            detector,
            store: Mutex::new(store),
            attachments,
            workflows: RwLock::new(HashMap::new()),
            workflow_capacity: MAX_OPEN_CASES,
        }
    }

    /// State backed by the configured data directory.
    pub fn from_config() -> Result<Self, CoreError> {
        let data_dir = config::app_data_dir();
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| CoreError::Startup(format!("{}: {e}", data_dir.display())))?;

        let catalog = ReferenceCatalog::load_or_bundled(&config::reference_dir())?;
        let store = SqliteCaseStore::open(&config::database_path())?;
        let attachments = AttachmentStore::new(config::attachments_dir());
        tracing::info!(data_dir = %data_dir.display(), "Core state ready");
        Ok(Self::new(catalog, store, attachments))
    }

    /// Fixture catalog, in-memory database, attachments under `attachments_root`.
    pub fn in_memory(attachments_root: impl Into<std::path::PathBuf>) -> Result<Self, CoreError> {
        Ok(Self::new(
            ReferenceCatalog::load_test(),
            SqliteCaseStore::open_in_memory()?,
            AttachmentStore::new(attachments_root),
        ))
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    pub fn detector(&self) -> &ConditionDetector {
        &self.detector
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, SqliteCaseStore>, CoreError> {
        self.store.lock().map_err(|_| CoreError::LockPoisoned)
    }

    /// Run a closure against the case store.
    pub fn with_store<T>(
        &self,
        f: impl FnOnce(&dyn CaseStore) -> Result<T, ClaimError>,
    ) -> Result<T, CoreError> {
        let store = self.lock_store()?;
        Ok(f(&*store)?)
    }

    /// Run a closure against an open workflow, loading it from the store
    /// on first use.
    pub fn with_workflow<T>(
        &self,
        case_id: Uuid,
        f: impl FnOnce(&mut CaseWorkflow, &Services<'_>) -> Result<T, ClaimError>,
    ) -> Result<T, CoreError> {
        let mut workflows = self.workflows.write().map_err(|_| CoreError::LockPoisoned)?;
        let store = self.lock_store()?;

        if !workflows.contains_key(&case_id) {
            let workflow = CaseWorkflow::open(&*store, case_id)?;
            self.make_room(&mut workflows);
            workflows.insert(case_id, workflow);
        }
        let workflow = workflows
            .get_mut(&case_id)
            .ok_or(CoreError::Claim(ClaimError::CaseNotFound(case_id)))?;

        let services = Services {
            catalog: &self.catalog,
            detector: &self.detector,
            store: &*store,
        };
        Ok(f(workflow, &services)?)
    }

    // ── Patients ────────────────────────────────────────────

    pub fn create_patient(&self, patient: Patient) -> Result<Patient, CoreError> {
        self.with_store(|store| {
            store.save_patient(&patient)?;
            Ok(())
        })?;
        tracing::info!(patient_id = %patient.id, plan = %patient.plan, "Patient created");
        Ok(patient)
    }

    pub fn get_patient(&self, id: Uuid) -> Result<Patient, CoreError> {
        self.with_store(|store| Ok(store.load_patient(&id)?))?
            .ok_or(CoreError::PatientNotFound(id))
    }

    pub fn list_patients(&self) -> Result<Vec<Patient>, CoreError> {
        self.with_store(|store| Ok(store.list_patients()?))
    }

    pub fn list_cases(&self, patient_id: Uuid) -> Result<Vec<Case>, CoreError> {
        self.get_patient(patient_id)?;
        self.with_store(|store| Ok(store.list_cases(&patient_id)?))
    }

    // ── Cases ───────────────────────────────────────────────

    /// Start and persist a new case. The plan defaults to the patient's.
    pub fn start_case(&self, patient_id: Uuid, plan: Option<Plan>) -> Result<CaseView, CoreError> {
        let patient = self.get_patient(patient_id)?;
        let mut workflow = CaseWorkflow::start(patient.id, plan.unwrap_or(patient.plan));

        let mut workflows = self.workflows.write().map_err(|_| CoreError::LockPoisoned)?;
        {
            let store = self.lock_store()?;
            workflow.save(&*store)?;
        }
        let view = workflow.view();
        self.make_room(&mut workflows);
        workflows.insert(workflow.id(), workflow);
        Ok(view)
    }

    /// Drop clean workflows once the cache is full. Workflows with unsaved
    /// edits or an open encounter stay, even past capacity.
    fn make_room(&self, workflows: &mut HashMap<Uuid, CaseWorkflow>) {
        if workflows.len() < self.workflow_capacity {
            return;
        }
        let before = workflows.len();
        workflows.retain(|_, wf| !wf.is_clean());
        let evicted = before - workflows.len();
        if workflows.len() >= self.workflow_capacity {
            tracing::warn!(open = workflows.len(), evicted, "Workflow cache over capacity with unsaved cases");
        } else {
            tracing::debug!(evicted, "Workflow cache trimmed");
        }
    }

    pub fn case_view(&self, case_id: Uuid) -> Result<CaseView, CoreError> {
        self.with_workflow(case_id, |wf, _| Ok(wf.view()))
    }

    /// Archive and persist the case, then drop it from the cache; later
    /// reads reload the read-only case from the store.
    pub fn archive_case(&self, case_id: Uuid) -> Result<CaseView, CoreError> {
        let mut workflows = self.workflows.write().map_err(|_| CoreError::LockPoisoned)?;
        let store = self.lock_store()?;

        let mut workflow = match workflows.remove(&case_id) {
            Some(wf) => wf,
            None => CaseWorkflow::open(&*store, case_id)?,
        };
        if let Err(err) = workflow.archive(&*store) {
            workflows.insert(case_id, workflow);
            return Err(err.into());
        }
        Ok(workflow.view())
    }

    /// Operator hard delete.
    pub fn delete_case(&self, case_id: Uuid) -> Result<(), CoreError> {
        let mut workflows = self.workflows.write().map_err(|_| CoreError::LockPoisoned)?;
        let store = self.lock_store()?;
        store.delete_case(&case_id).map_err(|e| match e {
            db::DatabaseError::NotFound { .. } => CoreError::Claim(ClaimError::CaseNotFound(case_id)),
            other => CoreError::Database(other),
        })?;
        workflows.remove(&case_id);
        Ok(())
    }

    pub fn export(&self, case_id: Uuid) -> Result<ClaimDocument, CoreError> {
        self.with_store(|store| ClaimDocument::build(store, case_id))
    }

    // ── Referrals ───────────────────────────────────────────

    pub fn draft_referral(
        &self,
        case_id: Uuid,
        specialist_type: &str,
        urgency_level: UrgencyLevel,
        clinical_summary: Option<&str>,
    ) -> Result<ReferralLetter, CoreError> {
        self.with_workflow(case_id, |wf, services| {
            let letter = referral::draft_referral(wf.case(), specialist_type, urgency_level, clinical_summary)?;
            services.store.save_referral(&letter)?;
            Ok(letter)
        })
    }

    pub fn list_referrals(&self, case_id: Uuid) -> Result<Vec<ReferralLetter>, CoreError> {
        self.with_workflow(case_id, |_, services| Ok(services.store.list_referrals(&case_id)?))
    }

    /// Apply a status change and persist it; the stored letter is untouched
    /// when either step fails.
    pub fn update_referral(&self, referral_id: Uuid, action: ReferralAction) -> Result<ReferralLetter, CoreError> {
        let store = self.lock_store()?;
        let mut letter = store
            .load_referral(&referral_id)?
            .ok_or(CoreError::ReferralNotFound(referral_id))?;
        match action {
            ReferralAction::Send => referral::mark_sent(&mut letter)?,
            ReferralAction::Acknowledge => referral::acknowledge(&mut letter)?,
            ReferralAction::Cancel => referral::cancel(&mut letter)?,
        }
        store.save_referral(&letter)?;
        Ok(letter)
    }

    // ── Attachments ─────────────────────────────────────────

    /// Store a documentation file for an existing case.
    pub async fn store_attachment(
        &self,
        case_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredAttachment, CoreError> {
        self.ensure_case(case_id)?;
        Ok(self.attachments.store(case_id, file_name, bytes).await?)
    }

    /// Content of a file previously stored for the case.
    pub async fn read_attachment(&self, case_id: Uuid, content_hash: &str) -> Result<Vec<u8>, CoreError> {
        self.ensure_case(case_id)?;
        Ok(self.attachments.read(case_id, content_hash).await?)
    }

    fn ensure_case(&self, case_id: Uuid) -> Result<(), CoreError> {
        let exists = self.with_store(|store| Ok(store.load_case(&case_id)?.is_some()))?;
        if !exists {
            return Err(CoreError::Claim(ClaimError::CaseNotFound(case_id)));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Reference data error: {0}")]
    Reference(#[from] ReferenceError),
    #[error("Attachment error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Claim(#[from] ClaimError),
    #[error("Patient not found: {0}")]
    PatientNotFound(Uuid),
    #[error("Referral not found: {0}")]
    ReferralNotFound(Uuid),
    #[error("Startup failed: {0}")]
    Startup(String),
}
