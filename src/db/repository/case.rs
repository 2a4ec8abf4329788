use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{from_json, parse_timestamp, parse_uuid, to_json};
use crate::db::DatabaseError;
use crate::models::enums::{CaseStatus, Plan, WorkflowStep};
use crate::models::{Case, SelectedBasketItem};

const CASE_COLUMNS: &str = "id, patient_id, patient_note, detected_conditions, confirmed_condition,
     selected_icd_codes, selected_treatments, selected_medications, chronic_registration_notes,
     active_plan, current_step, status, created_at, updated_at, ongoing_skipped";

/// Insert or update a case. Upsert keeps the row in place so its activities
/// and referrals are never cascaded away.
pub fn upsert_case(conn: &Connection, case: &Case) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO cases (id, patient_id, patient_note, detected_conditions, confirmed_condition,
         selected_icd_codes, selected_treatments, selected_medications, chronic_registration_notes,
         active_plan, current_step, status, created_at, updated_at, ongoing_skipped)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
         ON CONFLICT(id) DO UPDATE SET
            patient_note = excluded.patient_note,
            detected_conditions = excluded.detected_conditions,
            confirmed_condition = excluded.confirmed_condition,
            selected_icd_codes = excluded.selected_icd_codes,
            selected_treatments = excluded.selected_treatments,
            selected_medications = excluded.selected_medications,
            chronic_registration_notes = excluded.chronic_registration_notes,
            active_plan = excluded.active_plan,
            current_step = excluded.current_step,
            status = excluded.status,
            updated_at = excluded.updated_at,
            ongoing_skipped = excluded.ongoing_skipped",
        params![
            case.id.to_string(),
            case.patient_id.to_string(),
            case.patient_note,
            to_json(&case.detected_conditions)?,
            case.confirmed_condition,
            to_json(&case.selected_icd_codes)?,
            to_json(&case.selected_treatments)?,
            to_json(&case.selected_medications)?,
            to_json(&case.chronic_registration_notes)?,
            case.active_plan.as_str(),
            case.current_step.as_str(),
            case.status.as_str(),
            case.created_at.to_rfc3339(),
            case.updated_at.to_rfc3339(),
            case.ongoing_skipped,
        ],
    )?;
    Ok(())
}

pub fn get_case(conn: &Connection, id: &Uuid) -> Result<Option<Case>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1"),
            params![id.to_string()],
            case_row_from_rusqlite,
        )
        .optional()?;
    row.map(case_from_row).transpose()
}

/// Cases of one patient, newest first.
pub fn list_cases_for_patient(conn: &Connection, patient_id: &Uuid) -> Result<Vec<Case>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CASE_COLUMNS} FROM cases WHERE patient_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], case_row_from_rusqlite)?;

    let mut cases = Vec::new();
    for row in rows {
        cases.push(case_from_row(row?)?);
    }
    Ok(cases)
}

/// Hard delete; activities and referrals cascade.
pub fn delete_case(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute("DELETE FROM cases WHERE id = ?1", params![id.to_string()])?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "case".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct CaseRow {
    id: String,
    patient_id: String,
    patient_note: String,
    detected_conditions: String,
    confirmed_condition: Option<String>,
    selected_icd_codes: String,
    selected_treatments: String,
    selected_medications: String,
    chronic_registration_notes: String,
    active_plan: String,
    current_step: String,
    status: String,
    created_at: String,
    updated_at: String,
    ongoing_skipped: bool,
}

fn case_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<CaseRow, rusqlite::Error> {
    Ok(CaseRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        patient_note: row.get(2)?,
        detected_conditions: row.get(3)?,
        confirmed_condition: row.get(4)?,
        selected_icd_codes: row.get(5)?,
        selected_treatments: row.get(6)?,
        selected_medications: row.get(7)?,
        chronic_registration_notes: row.get(8)?,
        active_plan: row.get(9)?,
        current_step: row.get(10)?,
        status: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
        ongoing_skipped: row.get(14)?,
    })
}

fn case_from_row(row: CaseRow) -> Result<Case, DatabaseError> {
    let id = row.id.as_str();
    let selected_treatments: Vec<SelectedBasketItem> =
        from_json("case", id, "selected_treatments", &row.selected_treatments)?;
    validate_treatments(id, &selected_treatments)?;

    Ok(Case {
        id: parse_uuid(id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        patient_note: row.patient_note,
        detected_conditions: from_json("case", id, "detected_conditions", &row.detected_conditions)?,
        confirmed_condition: row.confirmed_condition,
        selected_icd_codes: from_json("case", id, "selected_icd_codes", &row.selected_icd_codes)?,
        selected_treatments,
        selected_medications: from_json("case", id, "selected_medications", &row.selected_medications)?,
        chronic_registration_notes: from_json(
            "case",
            id,
            "chronic_registration_notes",
            &row.chronic_registration_notes,
        )?,
        active_plan: Plan::from_str(&row.active_plan)?,
        current_step: WorkflowStep::from_str(&row.current_step)?,
        ongoing_skipped: row.ongoing_skipped,
        status: CaseStatus::from_str(&row.status)?,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}

fn validate_treatments(case_id: &str, items: &[SelectedBasketItem]) -> Result<(), DatabaseError> {
    for item in items {
        if item.selected_quantity > item.coverage_limit {
            return Err(DatabaseError::InvalidRecord {
                entity_type: "case".into(),
                id: case_id.into(),
                reason: format!(
                    "{} quantity {} exceeds coverage limit {}",
                    item.code, item.selected_quantity, item.coverage_limit
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::upsert_patient;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::BasketType;
    use crate::models::{BasketItemDefinition, Condition, Medicine, Patient, RegistrationNote};
    use chrono::Utc;

    fn seeded() -> (Connection, Patient) {
        let conn = open_memory_database().unwrap();
        let patient = Patient::new("Sipho Dlamini", Plan::Comprehensive);
        upsert_patient(&conn, &patient).unwrap();
        (conn, patient)
    }

    fn full_case(patient_id: Uuid) -> Case {
        let mut case = Case::new(patient_id, Plan::Saver);
        case.patient_note = "Polyuria, polydipsia".into();
        case.detected_conditions = vec!["Diabetes Insipidus".into()];
        case.confirmed_condition = Some("Diabetes Insipidus".into());
        case.selected_icd_codes = vec![Condition {
            name: "Diabetes Insipidus".into(),
            icd_code: "E23.2".into(),
            icd_description: "Diabetes insipidus".into(),
        }];
        let mut item = SelectedBasketItem::from_definition(
            &BasketItemDefinition {
                code: "4032".into(),
                description: "Urea and electrolytes".into(),
                coverage_limit: 2,
                specialists_covered: None,
            },
            BasketType::Ongoing,
        );
        item.selected_quantity = 2;
        item.usage_count = 1;
        case.selected_treatments = vec![item];
        case.selected_medications = vec![Medicine {
            condition: "Diabetes Insipidus".into(),
            medicine_class: "Vasopressin analogues".into(),
            active_ingredient: "Desmopressin".into(),
            medicine_name_strength: "Minirin 0.1mg".into(),
            cda_core_priority_saver: "R 200".into(),
            cda_executive_comprehensive: "R 400".into(),
            plans_excluded: [Plan::KeyCare].into_iter().collect(),
        }];
        case.chronic_registration_notes = vec![RegistrationNote {
            body: "Registered".into(),
            created_at: Utc::now(),
        }];
        case.current_step = WorkflowStep::MedicationsSelected;
        case.ongoing_skipped = true;
        case
    }

    #[test]
    fn case_round_trips_all_snapshots() {
        let (conn, patient) = seeded();
        let case = full_case(patient.id);
        upsert_case(&conn, &case).unwrap();

        let loaded = get_case(&conn, &case.id).unwrap().unwrap();
        assert_eq!(loaded, case);
        assert_eq!(loaded.selected_treatments[0].usage_count, 1);
    }

    #[test]
    fn upsert_overwrites_snapshot() {
        let (conn, patient) = seeded();
        let mut case = full_case(patient.id);
        upsert_case(&conn, &case).unwrap();

        case.status = CaseStatus::Completed;
        case.current_step = WorkflowStep::Finalized;
        upsert_case(&conn, &case).unwrap();

        let cases = list_cases_for_patient(&conn, &patient.id).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].status, CaseStatus::Completed);
    }

    #[test]
    fn over_limit_quantity_fails_validation_on_load() {
        let (conn, patient) = seeded();
        let case = full_case(patient.id);
        upsert_case(&conn, &case).unwrap();
        conn.execute(
            "UPDATE cases SET selected_treatments = ?1 WHERE id = ?2",
            params![
                r#"[{"code":"4032","description":"U&E","coverage_limit":2,"basket_type":"ongoing","selected_quantity":9,"usage_count":0}]"#,
                case.id.to_string()
            ],
        )
        .unwrap();

        let err = get_case(&conn, &case.id).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidRecord { .. }));
    }

    #[test]
    fn malformed_json_column_fails_with_invalid_record() {
        let (conn, patient) = seeded();
        let case = full_case(patient.id);
        upsert_case(&conn, &case).unwrap();
        conn.execute(
            "UPDATE cases SET selected_medications = 'not json' WHERE id = ?1",
            params![case.id.to_string()],
        )
        .unwrap();

        assert!(matches!(
            get_case(&conn, &case.id),
            Err(DatabaseError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn case_requires_existing_patient() {
        let conn = open_memory_database().unwrap();
        let case = Case::new(Uuid::new_v4(), Plan::Core);
        assert!(upsert_case(&conn, &case).is_err());
    }

    #[test]
    fn delete_missing_case_is_not_found() {
        let (conn, _) = seeded();
        assert!(matches!(
            delete_case(&conn, &Uuid::new_v4()),
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
