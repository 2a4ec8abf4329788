//! Clinician-facing text composed from case state.

use crate::models::enums::BasketType;
use crate::models::{Case, OngoingManagementActivity, SelectedBasketItem};

/// Chronic registration note written at finalization when the clinician has
/// not added one.
pub fn compose_registration_note(case: &Case) -> String {
    let mut lines = Vec::new();

    let condition = case.confirmed_condition.as_deref().unwrap_or("Unconfirmed condition");
    lines.push(format!("Chronic registration: {condition}"));

    if !case.selected_icd_codes.is_empty() {
        let codes: Vec<String> = case
            .selected_icd_codes
            .iter()
            .map(|c| format!("{} {}", c.icd_code, c.icd_description))
            .collect();
        lines.push(format!("ICD-10: {}", codes.join("; ")));
    }

    lines.push(format!(
        "Diagnostic basket: {}",
        basket_line(case.items_in(BasketType::Diagnostic))
    ));

    if case.ongoing_skipped && case.items_in(BasketType::Ongoing).next().is_none() {
        lines.push("Ongoing management basket: not requested".into());
    } else {
        lines.push(format!(
            "Ongoing management basket: {}",
            basket_line(case.items_in(BasketType::Ongoing))
        ));
    }

    if !case.selected_medications.is_empty() {
        let plan = case.active_plan;
        let meds: Vec<String> = case
            .selected_medications
            .iter()
            .map(|m| {
                format!(
                    "{} ({}), CDA {}",
                    m.medicine_name_strength,
                    m.active_ingredient,
                    m.cda_for(plan)
                )
            })
            .collect();
        lines.push(format!("Medicines ({} plan): {}", plan.label(), meds.join("; ")));
    }

    let note = case.patient_note.trim();
    if !note.is_empty() {
        lines.push(format!("Clinical note: {note}"));
    }

    lines.join("\n")
}

fn basket_line<'a>(items: impl Iterator<Item = &'a SelectedBasketItem>) -> String {
    let parts: Vec<String> = items
        .map(|i| format!("{} {} x{}", i.code, i.description, i.selected_quantity))
        .collect();
    if parts.is_empty() {
        "none".into()
    } else {
        parts.join("; ")
    }
}

/// One-line description of a recorded encounter.
pub fn encounter_summary(activity: &OngoingManagementActivity) -> String {
    let codes: Vec<String> = activity
        .attachments
        .iter()
        .map(|a| format!("{} ({} used)", a.code, a.usage_count))
        .collect();
    let who = activity
        .specialist_type
        .as_deref()
        .map(|s| format!(" with {s}"))
        .unwrap_or_default();
    format!(
        "{} on {}{}: {}",
        activity.activity_type,
        activity.activity_date,
        who,
        codes.join(", ")
    )
}

/// Default clinical summary for a referral letter.
pub fn referral_summary(case: &Case) -> String {
    let condition = case.confirmed_condition.as_deref().unwrap_or("chronic condition");
    let codes: Vec<&str> = case.selected_icd_codes.iter().map(|c| c.icd_code.as_str()).collect();
    let mut summary = if codes.is_empty() {
        format!("Referred for {condition}.")
    } else {
        format!("Referred for {condition} ({}).", codes.join(", "))
    };
    if !case.selected_medications.is_empty() {
        let meds: Vec<&str> = case
            .selected_medications
            .iter()
            .map(|m| m.medicine_name_strength.as_str())
            .collect();
        summary.push_str(&format!(" Current medicines: {}.", meds.join(", ")));
    }
    let note = case.patient_note.trim();
    if !note.is_empty() {
        summary.push_str(&format!(" Presenting note: {note}"));
    }
    summary
}
