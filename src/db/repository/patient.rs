use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{parse_date, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::Plan;
use crate::models::Patient;

/// Insert or update a patient. Upsert keeps the row (and its cases) in place.
pub fn upsert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, full_name, date_of_birth, medical_aid_number, plan,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            full_name = excluded.full_name,
            date_of_birth = excluded.date_of_birth,
            medical_aid_number = excluded.medical_aid_number,
            plan = excluded.plan,
            updated_at = excluded.updated_at",
        params![
            patient.id.to_string(),
            patient.full_name,
            patient.date_of_birth.map(|d| d.to_string()),
            patient.medical_aid_number,
            patient.plan.as_str(),
            patient.created_at.to_rfc3339(),
            patient.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, full_name, date_of_birth, medical_aid_number, plan, created_at, updated_at
             FROM patients WHERE id = ?1",
            params![id.to_string()],
            patient_row_from_rusqlite,
        )
        .optional()?;
    row.map(patient_from_row).transpose()
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, full_name, date_of_birth, medical_aid_number, plan, created_at, updated_at
         FROM patients ORDER BY full_name COLLATE NOCASE",
    )?;
    let rows = stmt.query_map([], patient_row_from_rusqlite)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

struct PatientRow {
    id: String,
    full_name: String,
    date_of_birth: Option<String>,
    medical_aid_number: Option<String>,
    plan: String,
    created_at: String,
    updated_at: String,
}

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        full_name: row.get(1)?,
        date_of_birth: row.get(2)?,
        medical_aid_number: row.get(3)?,
        plan: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: parse_uuid(&row.id)?,
        full_name: row.full_name,
        date_of_birth: row.date_of_birth.as_deref().map(parse_date).transpose()?,
        medical_aid_number: row.medical_aid_number,
        plan: Plan::from_str(&row.plan)?,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::NaiveDate;

    #[test]
    fn patient_insert_and_retrieve() {
        let conn = open_memory_database().unwrap();
        let mut patient = Patient::new("Thandi Mokoena", Plan::KeyCare);
        patient.date_of_birth = NaiveDate::from_ymd_opt(1971, 8, 14);
        patient.medical_aid_number = Some("DH-0042".into());
        upsert_patient(&conn, &patient).unwrap();

        let loaded = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(loaded, patient);
    }

    #[test]
    fn upsert_updates_in_place() {
        let conn = open_memory_database().unwrap();
        let mut patient = Patient::new("A. Patel", Plan::Core);
        upsert_patient(&conn, &patient).unwrap();
        patient.plan = Plan::Executive;
        upsert_patient(&conn, &patient).unwrap();

        let all = list_patients(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].plan, Plan::Executive);
    }

    #[test]
    fn missing_patient_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_patient(&conn, &Uuid::new_v4()).unwrap().is_none());
    }
}
