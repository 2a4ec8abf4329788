use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{from_json, parse_date, parse_timestamp, parse_uuid, to_json};
use crate::db::DatabaseError;
use crate::models::enums::ActivityType;
use crate::models::OngoingManagementActivity;

/// Append an encounter. Returns `false` when an activity with the same id
/// already exists, which makes a retried save point harmless.
pub fn insert_activity(conn: &Connection, activity: &OngoingManagementActivity) -> Result<bool, DatabaseError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO activities (id, case_id, activity_type, activity_date,
         specialist_type, clinical_notes, attachments, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            activity.id.to_string(),
            activity.case_id.to_string(),
            activity.activity_type.as_str(),
            activity.activity_date.to_string(),
            activity.specialist_type,
            activity.clinical_notes,
            to_json(&activity.attachments)?,
            activity.created_by,
            activity.created_at.to_rfc3339(),
        ],
    )?;
    Ok(inserted > 0)
}

/// Encounters of a case in replay order.
pub fn list_activities(conn: &Connection, case_id: &Uuid) -> Result<Vec<OngoingManagementActivity>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, case_id, activity_type, activity_date, specialist_type, clinical_notes,
         attachments, created_by, created_at
         FROM activities WHERE case_id = ?1
         ORDER BY activity_date ASC, created_at ASC",
    )?;
    let rows = stmt.query_map(params![case_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, String>(8)?,
        ))
    })?;

    let mut activities = Vec::new();
    for row in rows {
        let (id, case_id, activity_type, date, specialist, notes, attachments, created_by, created_at) = row?;
        activities.push(OngoingManagementActivity {
            attachments: from_json("activity", &id, "attachments", &attachments)?,
            id: parse_uuid(&id)?,
            case_id: parse_uuid(&case_id)?,
            activity_type: ActivityType::from_str(&activity_type)?,
            activity_date: parse_date(&date)?,
            specialist_type: specialist,
            clinical_notes: notes,
            created_by,
            created_at: parse_timestamp(&created_at)?,
        });
    }
    Ok(activities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{upsert_case, upsert_patient};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::Plan;
    use crate::models::{ActivityAttachment, Case, Patient};
    use chrono::{NaiveDate, Utc};

    fn seeded_case(conn: &Connection) -> Case {
        let patient = Patient::new("Lerato Khumalo", Plan::Core);
        upsert_patient(conn, &patient).unwrap();
        let case = Case::new(patient.id, Plan::Core);
        upsert_case(conn, &case).unwrap();
        case
    }

    fn encounter(case_id: Uuid, day: u32) -> OngoingManagementActivity {
        OngoingManagementActivity {
            id: Uuid::new_v4(),
            case_id,
            activity_type: ActivityType::DiagnosticTest,
            activity_date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            specialist_type: None,
            clinical_notes: "Repeat U&E".into(),
            attachments: vec![ActivityAttachment {
                code: "4032".into(),
                description: "Urea and electrolytes".into(),
                usage_count: 1,
            }],
            created_by: "dr.botha".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn activities_list_in_date_order() {
        let conn = open_memory_database().unwrap();
        let case = seeded_case(&conn);
        let late = encounter(case.id, 20);
        let early = encounter(case.id, 3);
        insert_activity(&conn, &late).unwrap();
        insert_activity(&conn, &early).unwrap();

        let listed = list_activities(&conn, &case.id).unwrap();
        assert_eq!(listed, vec![early, late]);
    }

    #[test]
    fn duplicate_activity_is_ignored() {
        let conn = open_memory_database().unwrap();
        let case = seeded_case(&conn);
        let a = encounter(case.id, 1);
        assert!(insert_activity(&conn, &a).unwrap());
        assert!(!insert_activity(&conn, &a).unwrap());
        assert_eq!(list_activities(&conn, &case.id).unwrap().len(), 1);
    }

    #[test]
    fn activity_requires_existing_case() {
        let conn = open_memory_database().unwrap();
        assert!(insert_activity(&conn, &encounter(Uuid::new_v4(), 1)).is_err());
    }
}
