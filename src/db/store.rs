use std::path::Path;

use rusqlite::Connection;
use uuid::Uuid;

use super::repository::*;
use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::{Case, OngoingManagementActivity, Patient, ReferralLetter};

/// Durable persistence of cases and everything hanging off them.
///
/// Calls are synchronous; last write wins.
pub trait CaseStore {
    fn save_patient(&self, patient: &Patient) -> Result<(), DatabaseError>;
    fn load_patient(&self, id: &Uuid) -> Result<Option<Patient>, DatabaseError>;
    fn list_patients(&self) -> Result<Vec<Patient>, DatabaseError>;

    fn save_case(&self, case: &Case) -> Result<(), DatabaseError>;
    fn load_case(&self, id: &Uuid) -> Result<Option<Case>, DatabaseError>;
    fn list_cases(&self, patient_id: &Uuid) -> Result<Vec<Case>, DatabaseError>;
    fn delete_case(&self, id: &Uuid) -> Result<(), DatabaseError>;

    /// Append an encounter and write the case snapshot that reflects it, as
    /// one unit: either both are stored or neither is. A repeated activity id
    /// is not appended again and returns `false`.
    fn record_encounter(&self, activity: &OngoingManagementActivity, case: &Case) -> Result<bool, DatabaseError>;
    fn list_activities(&self, case_id: &Uuid) -> Result<Vec<OngoingManagementActivity>, DatabaseError>;

    fn save_referral(&self, referral: &ReferralLetter) -> Result<(), DatabaseError>;
    fn load_referral(&self, id: &Uuid) -> Result<Option<ReferralLetter>, DatabaseError>;
    fn list_referrals(&self, case_id: &Uuid) -> Result<Vec<ReferralLetter>, DatabaseError>;
}

/// SQLite-backed [`CaseStore`].
pub struct SqliteCaseStore {
    conn: Connection,
}

impl SqliteCaseStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: open_database(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: open_memory_database()?,
        })
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl CaseStore for SqliteCaseStore {
    fn save_patient(&self, patient: &Patient) -> Result<(), DatabaseError> {
        upsert_patient(&self.conn, patient)
    }

    fn load_patient(&self, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
        get_patient(&self.conn, id)
    }

    fn list_patients(&self) -> Result<Vec<Patient>, DatabaseError> {
        list_patients(&self.conn)
    }

    fn save_case(&self, case: &Case) -> Result<(), DatabaseError> {
        upsert_case(&self.conn, case)?;
        tracing::debug!(case_id = %case.id, step = %case.current_step, "Case saved");
        Ok(())
    }

    fn load_case(&self, id: &Uuid) -> Result<Option<Case>, DatabaseError> {
        get_case(&self.conn, id)
    }

    fn list_cases(&self, patient_id: &Uuid) -> Result<Vec<Case>, DatabaseError> {
        list_cases_for_patient(&self.conn, patient_id)
    }

    fn delete_case(&self, id: &Uuid) -> Result<(), DatabaseError> {
        delete_case(&self.conn, id)?;
        tracing::info!(case_id = %id, "Case deleted");
        Ok(())
    }

    fn record_encounter(&self, activity: &OngoingManagementActivity, case: &Case) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let inserted = insert_activity(&tx, activity)?;
        upsert_case(&tx, case)?;
        tx.commit()?;

        if !inserted {
            tracing::debug!(activity_id = %activity.id, "Activity already stored");
        }
        tracing::debug!(case_id = %case.id, activity_id = %activity.id, "Encounter recorded");
        Ok(inserted)
    }

    fn list_activities(&self, case_id: &Uuid) -> Result<Vec<OngoingManagementActivity>, DatabaseError> {
        list_activities(&self.conn, case_id)
    }

    fn save_referral(&self, referral: &ReferralLetter) -> Result<(), DatabaseError> {
        upsert_referral(&self.conn, referral)
    }

    fn load_referral(&self, id: &Uuid) -> Result<Option<ReferralLetter>, DatabaseError> {
        get_referral(&self.conn, id)
    }

    fn list_referrals(&self, case_id: &Uuid) -> Result<Vec<ReferralLetter>, DatabaseError> {
        list_referrals_for_case(&self.conn, case_id)
    }
}
