use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{ReferralStatus, UrgencyLevel};
use crate::models::ReferralLetter;

pub fn upsert_referral(conn: &Connection, referral: &ReferralLetter) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO referrals (id, case_id, patient_id, specialist_type, urgency_level,
         clinical_summary, status, created_at, sent_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
            specialist_type = excluded.specialist_type,
            urgency_level = excluded.urgency_level,
            clinical_summary = excluded.clinical_summary,
            status = excluded.status,
            sent_at = excluded.sent_at",
        params![
            referral.id.to_string(),
            referral.case_id.to_string(),
            referral.patient_id.to_string(),
            referral.specialist_type,
            referral.urgency_level.as_str(),
            referral.clinical_summary,
            referral.status.as_str(),
            referral.created_at.to_rfc3339(),
            referral.sent_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub fn get_referral(conn: &Connection, id: &Uuid) -> Result<Option<ReferralLetter>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, case_id, patient_id, specialist_type, urgency_level, clinical_summary,
             status, created_at, sent_at
             FROM referrals WHERE id = ?1",
            params![id.to_string()],
            referral_row_from_rusqlite,
        )
        .optional()?;
    row.map(referral_from_row).transpose()
}

pub fn list_referrals_for_case(conn: &Connection, case_id: &Uuid) -> Result<Vec<ReferralLetter>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, case_id, patient_id, specialist_type, urgency_level, clinical_summary,
         status, created_at, sent_at
         FROM referrals WHERE case_id = ?1 ORDER BY created_at ASC",
    )?;
    let rows = stmt.query_map(params![case_id.to_string()], referral_row_from_rusqlite)?;

    let mut referrals = Vec::new();
    for row in rows {
        referrals.push(referral_from_row(row?)?);
    }
    Ok(referrals)
}

struct ReferralRow {
    id: String,
    case_id: String,
    patient_id: String,
    specialist_type: String,
    urgency_level: String,
    clinical_summary: String,
    status: String,
    created_at: String,
    sent_at: Option<String>,
}

fn referral_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ReferralRow, rusqlite::Error> {
    Ok(ReferralRow {
        id: row.get(0)?,
        case_id: row.get(1)?,
        patient_id: row.get(2)?,
        specialist_type: row.get(3)?,
        urgency_level: row.get(4)?,
        clinical_summary: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        sent_at: row.get(8)?,
    })
}

fn referral_from_row(row: ReferralRow) -> Result<ReferralLetter, DatabaseError> {
    Ok(ReferralLetter {
        id: parse_uuid(&row.id)?,
        case_id: parse_uuid(&row.case_id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        specialist_type: row.specialist_type,
        urgency_level: UrgencyLevel::from_str(&row.urgency_level)?,
        clinical_summary: row.clinical_summary,
        status: ReferralStatus::from_str(&row.status)?,
        created_at: parse_timestamp(&row.created_at)?,
        sent_at: row.sent_at.as_deref().map(parse_timestamp).transpose()?,
    })
}
