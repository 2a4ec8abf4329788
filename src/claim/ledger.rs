use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::enums::BasketType;
use crate::models::{BasketItemDefinition, ItemDocumentation, OngoingManagementActivity, SelectedBasketItem};

use super::types::{ClaimError, EncounterOutcome, RejectedCode, RejectionReason, SelectionChange};

/// One applied encounter: the codes it consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub activity_id: Uuid,
    pub activity_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub codes: Vec<String>,
}

/// Identity and ordering key of an encounter being recorded.
#[derive(Debug, Clone, Copy)]
pub struct EncounterKey {
    pub activity_id: Uuid,
    pub activity_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Selected basket items of one case plus the encounter log that consumes
/// them.
///
/// Usage is a fold over the log: `usage_count(code)` is the number of
/// applied encounters that consumed `code`. The `usage_count` field on each
/// ongoing [`SelectedBasketItem`] is a cache refreshed after every mutation,
/// so deselecting and reselecting an item never loses its usage.
#[derive(Debug, Clone, Default)]
pub struct BasketLedger {
    items: Vec<SelectedBasketItem>,
    log: Vec<UsageEntry>,
}

impl BasketLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted selection snapshot. Cached usage in the
    /// snapshot is discarded; call [`BasketLedger::replay`] with the
    /// activity log to restore it.
    pub fn from_snapshot(items: Vec<SelectedBasketItem>) -> Self {
        let mut ledger = Self {
            items,
            log: Vec::new(),
        };
        ledger.refresh_usage();
        ledger
    }

    pub fn items(&self) -> &[SelectedBasketItem] {
        &self.items
    }

    pub fn items_in(&self, basket_type: BasketType) -> impl Iterator<Item = &SelectedBasketItem> {
        self.items.iter().filter(move |i| i.basket_type == basket_type)
    }

    pub fn get(&self, basket_type: BasketType, code: &str) -> Option<&SelectedBasketItem> {
        self.items
            .iter()
            .find(|i| i.basket_type == basket_type && i.code == code)
    }

    pub fn is_selected(&self, basket_type: BasketType, code: &str) -> bool {
        self.get(basket_type, code).is_some()
    }

    pub fn log(&self) -> &[UsageEntry] {
        &self.log
    }

    pub fn has_applied(&self, activity_id: &Uuid) -> bool {
        self.log.iter().any(|e| e.activity_id == *activity_id)
    }

    /// Toggle an item in or out of the case's basket.
    pub fn select(&mut self, def: &BasketItemDefinition, basket_type: BasketType) -> SelectionChange {
        if let Some(pos) = self
            .items
            .iter()
            .position(|i| i.basket_type == basket_type && i.code == def.code)
        {
            self.items.remove(pos);
            tracing::debug!(code = %def.code, %basket_type, "Basket item deselected");
            return SelectionChange::Removed;
        }

        self.items
            .push(SelectedBasketItem::from_definition(def, basket_type));
        self.refresh_usage();
        tracing::debug!(code = %def.code, %basket_type, "Basket item selected");
        SelectionChange::Added
    }

    /// Replace the selected quantity. Negative or over-limit values are
    /// rejected and leave the item untouched.
    pub fn set_quantity(
        &mut self,
        basket_type: BasketType,
        code: &str,
        quantity: i64,
    ) -> Result<u32, ClaimError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.basket_type == basket_type && i.code == code)
            .ok_or_else(|| ClaimError::NotSelected(code.to_string()))?;

        let limit = item.coverage_limit;
        let valid = u32::try_from(quantity).ok().filter(|q| *q <= limit);
        match valid {
            Some(q) => {
                item.selected_quantity = q;
                Ok(q)
            }
            None => {
                tracing::debug!(code, quantity, limit, "Rejected basket quantity");
                Err(ClaimError::InvalidQuantity {
                    code: code.to_string(),
                    quantity,
                    limit,
                })
            }
        }
    }

    pub fn document(
        &mut self,
        basket_type: BasketType,
        code: &str,
        documentation: ItemDocumentation,
    ) -> Result<(), ClaimError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.basket_type == basket_type && i.code == code)
            .ok_or_else(|| ClaimError::NotSelected(code.to_string()))?;
        item.documentation = Some(documentation);
        Ok(())
    }

    /// Units of `code` consumed across all applied encounters.
    pub fn usage_count(&self, code: &str) -> u32 {
        self.log
            .iter()
            .filter(|e| e.codes.iter().any(|c| c == code))
            .count() as u32
    }

    /// Whether one more encounter may consume this item.
    pub fn can_admit(&self, item: &SelectedBasketItem) -> bool {
        self.usage_count(&item.code) < item.coverage_limit
    }

    /// The selected ongoing item for `code`, if another encounter may use it.
    pub fn check_admissible(&self, code: &str) -> Result<&SelectedBasketItem, ClaimError> {
        let item = self
            .get(BasketType::Ongoing, code)
            .ok_or_else(|| ClaimError::NotSelected(code.to_string()))?;
        if self.can_admit(item) {
            Ok(item)
        } else {
            Err(ClaimError::CoverageLimitReached {
                code: code.to_string(),
                usage: self.usage_count(code),
                limit: item.coverage_limit,
            })
        }
    }

    /// Selected ongoing items that can still be consumed.
    pub fn admissible_items(&self) -> Vec<&SelectedBasketItem> {
        self.items_in(BasketType::Ongoing)
            .filter(|i| self.can_admit(i))
            .collect()
    }

    /// Apply one encounter: each distinct code that is a selected ongoing
    /// item under its limit gains exactly one unit of usage.
    ///
    /// Idempotent per activity id: a second call with the same id changes
    /// nothing and reports the codes accepted the first time.
    pub fn record_encounter_usage(&mut self, key: EncounterKey, codes: &[String]) -> EncounterOutcome {
        if let Some(entry) = self.log.iter().find(|e| e.activity_id == key.activity_id) {
            tracing::debug!(activity_id = %key.activity_id, "Encounter already applied");
            return EncounterOutcome {
                activity_id: key.activity_id,
                accepted: entry.codes.clone(),
                rejected: Vec::new(),
                replayed: true,
            };
        }

        let mut seen = BTreeSet::new();
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for code in codes {
            if !seen.insert(code.as_str()) {
                continue;
            }
            match self.check_admissible(code) {
                Ok(_) => accepted.push(code.clone()),
                Err(ClaimError::CoverageLimitReached { .. }) => rejected.push(RejectedCode {
                    code: code.clone(),
                    reason: RejectionReason::CoverageLimitReached,
                }),
                Err(_) => rejected.push(RejectedCode {
                    code: code.clone(),
                    reason: RejectionReason::NotSelected,
                }),
            }
        }

        self.log.push(UsageEntry {
            activity_id: key.activity_id,
            activity_date: key.activity_date,
            created_at: key.created_at,
            codes: accepted.clone(),
        });
        self.refresh_usage();

        tracing::info!(
            activity_id = %key.activity_id,
            accepted = accepted.len(),
            rejected = rejected.len(),
            "Encounter usage recorded"
        );

        EncounterOutcome {
            activity_id: key.activity_id,
            accepted,
            rejected,
            replayed: false,
        }
    }

    /// Fold stored activities into the log in `(activity_date, created_at)`
    /// order. Activities already in the log are skipped, so replaying the
    /// same log any number of times yields the same usage.
    pub fn replay(&mut self, activities: &[OngoingManagementActivity]) {
        let mut ordered: Vec<&OngoingManagementActivity> = activities.iter().collect();
        ordered.sort_by_key(|a| (a.activity_date, a.created_at));

        for activity in ordered {
            if self.has_applied(&activity.id) {
                continue;
            }
            self.log.push(UsageEntry {
                activity_id: activity.id,
                activity_date: activity.activity_date,
                created_at: activity.created_at,
                codes: activity.codes().map(String::from).collect(),
            });
        }

        self.log.sort_by_key(|e| (e.activity_date, e.created_at));
        self.refresh_usage();
    }

    fn refresh_usage(&mut self) {
        let counts: Vec<u32> = self
            .items
            .iter()
            .map(|i| match i.basket_type {
                BasketType::Ongoing => self.usage_count(&i.code),
                BasketType::Diagnostic => 0,
            })
            .collect();
        for (item, count) in self.items.iter_mut().zip(counts) {
            item.usage_count = count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::ActivityType;
    use crate::models::ActivityAttachment;

    fn def(code: &str, limit: u32) -> BasketItemDefinition {
        BasketItemDefinition {
            code: code.into(),
            description: format!("Item {code}"),
            coverage_limit: limit,
            specialists_covered: None,
        }
    }

    fn key(day: u32) -> EncounterKey {
        EncounterKey {
            activity_id: Uuid::new_v4(),
            activity_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn activity(code: &str, day: u32) -> OngoingManagementActivity {
        OngoingManagementActivity {
            id: Uuid::new_v4(),
            case_id: Uuid::new_v4(),
            activity_type: ActivityType::FollowUp,
            activity_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            specialist_type: None,
            clinical_notes: "Routine follow up".into(),
            attachments: vec![ActivityAttachment {
                code: code.into(),
                description: format!("Item {code}"),
                usage_count: 1,
            }],
            created_by: "dr.naidoo".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn select_starts_at_zero_and_toggles_off() {
        let mut ledger = BasketLedger::new();
        assert_eq!(ledger.select(&def("4171", 4), BasketType::Diagnostic), SelectionChange::Added);
        let item = ledger.get(BasketType::Diagnostic, "4171").unwrap();
        assert_eq!(item.selected_quantity, 0);
        assert_eq!(item.usage_count, 0);

        assert_eq!(ledger.select(&def("4171", 4), BasketType::Diagnostic), SelectionChange::Removed);
        assert!(ledger.items().is_empty());
    }

    #[test]
    fn over_limit_quantity_rejected_and_unchanged() {
        let mut ledger = BasketLedger::new();
        ledger.select(&def("4171", 4), BasketType::Diagnostic);

        let err = ledger.set_quantity(BasketType::Diagnostic, "4171", 5).unwrap_err();
        assert_eq!(
            err,
            ClaimError::InvalidQuantity { code: "4171".into(), quantity: 5, limit: 4 }
        );
        assert_eq!(ledger.get(BasketType::Diagnostic, "4171").unwrap().selected_quantity, 0);
    }

    #[test]
    fn negative_quantity_rejected() {
        let mut ledger = BasketLedger::new();
        ledger.select(&def("4171", 4), BasketType::Diagnostic);
        ledger.set_quantity(BasketType::Diagnostic, "4171", 3).unwrap();

        assert!(ledger.set_quantity(BasketType::Diagnostic, "4171", -1).is_err());
        assert_eq!(ledger.get(BasketType::Diagnostic, "4171").unwrap().selected_quantity, 3);
    }

    #[test]
    fn quantity_always_within_bounds() {
        let mut ledger = BasketLedger::new();
        ledger.select(&def("4171", 4), BasketType::Diagnostic);
        for q in -3..10 {
            let _ = ledger.set_quantity(BasketType::Diagnostic, "4171", q);
            let stored = ledger.get(BasketType::Diagnostic, "4171").unwrap().selected_quantity;
            assert!(stored <= 4);
        }
    }

    #[test]
    fn quantity_on_unselected_item_is_not_selected() {
        let mut ledger = BasketLedger::new();
        assert_eq!(
            ledger.set_quantity(BasketType::Ongoing, "0190", 1),
            Err(ClaimError::NotSelected("0190".into()))
        );
    }

    #[test]
    fn third_encounter_over_limit_two_is_rejected() {
        let mut ledger = BasketLedger::new();
        ledger.select(&def("4032", 2), BasketType::Ongoing);
        let codes = vec!["4032".to_string()];

        let first = ledger.record_encounter_usage(key(1), &codes);
        let second = ledger.record_encounter_usage(key(2), &codes);
        assert_eq!(first.accepted, codes);
        assert_eq!(second.accepted, codes);
        assert_eq!(ledger.usage_count("4032"), 2);

        let third = ledger.record_encounter_usage(key(3), &codes);
        assert!(third.accepted.is_empty());
        assert_eq!(
            third.rejected,
            vec![RejectedCode { code: "4032".into(), reason: RejectionReason::CoverageLimitReached }]
        );
        assert_eq!(ledger.get(BasketType::Ongoing, "4032").unwrap().usage_count, 2);
    }

    #[test]
    fn one_unit_per_encounter_regardless_of_quantity_or_repeats() {
        let mut ledger = BasketLedger::new();
        ledger.select(&def("0190", 4), BasketType::Ongoing);
        ledger.set_quantity(BasketType::Ongoing, "0190", 3).unwrap();

        let codes = vec!["0190".to_string(), "0190".to_string()];
        let outcome = ledger.record_encounter_usage(key(1), &codes);
        assert_eq!(outcome.accepted, vec!["0190".to_string()]);
        assert_eq!(ledger.usage_count("0190"), 1);
    }

    #[test]
    fn unselected_code_is_rejected_as_not_selected() {
        let mut ledger = BasketLedger::new();
        ledger.select(&def("4032", 2), BasketType::Diagnostic);
        let outcome = ledger.record_encounter_usage(key(1), &["4032".to_string()]);
        assert_eq!(outcome.rejected[0].reason, RejectionReason::NotSelected);
    }

    #[test]
    fn zero_limit_is_never_admissible() {
        let mut ledger = BasketLedger::new();
        ledger.select(&def("4188", 0), BasketType::Ongoing);
        let item = ledger.get(BasketType::Ongoing, "4188").unwrap().clone();
        assert!(!ledger.can_admit(&item));
        assert!(ledger.admissible_items().is_empty());
    }

    #[test]
    fn same_activity_id_applies_once() {
        let mut ledger = BasketLedger::new();
        ledger.select(&def("4032", 5), BasketType::Ongoing);
        let k = key(1);
        let codes = vec!["4032".to_string()];

        ledger.record_encounter_usage(k, &codes);
        let again = ledger.record_encounter_usage(k, &codes);
        assert!(again.replayed);
        assert_eq!(again.accepted, codes);
        assert_eq!(ledger.usage_count("4032"), 1);
    }

    #[test]
    fn reselecting_restores_usage() {
        let mut ledger = BasketLedger::new();
        ledger.select(&def("4032", 3), BasketType::Ongoing);
        ledger.record_encounter_usage(key(1), &["4032".to_string()]);

        ledger.select(&def("4032", 3), BasketType::Ongoing);
        assert!(!ledger.is_selected(BasketType::Ongoing, "4032"));
        ledger.select(&def("4032", 3), BasketType::Ongoing);

        assert_eq!(ledger.get(BasketType::Ongoing, "4032").unwrap().usage_count, 1);
    }

    #[test]
    fn replay_twice_equals_replay_once() {
        let log = vec![activity("4032", 3), activity("4032", 1), activity("0190", 2)];

        let mut once = BasketLedger::from_snapshot(vec![
            SelectedBasketItem::from_definition(&def("4032", 5), BasketType::Ongoing),
            SelectedBasketItem::from_definition(&def("0190", 5), BasketType::Ongoing),
        ]);
        once.replay(&log);

        let mut twice = once.clone();
        twice.replay(&log);

        assert_eq!(once.items(), twice.items());
        assert_eq!(twice.usage_count("4032"), 2);
        assert_eq!(twice.usage_count("0190"), 1);
    }

    #[test]
    fn replay_orders_by_activity_date() {
        let mut ledger = BasketLedger::new();
        ledger.replay(&[activity("4032", 9), activity("4032", 2)]);
        let dates: Vec<u32> = ledger
            .log()
            .iter()
            .map(|e| chrono::Datelike::day(&e.activity_date))
            .collect();
        assert_eq!(dates, vec![2, 9]);
    }

    #[test]
    fn usage_never_decreases() {
        let mut ledger = BasketLedger::new();
        ledger.select(&def("4032", 3), BasketType::Ongoing);
        let mut last = 0;
        for day in 1..=6 {
            ledger.record_encounter_usage(key(day), &["4032".to_string()]);
            let now = ledger.usage_count("4032");
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 3);
    }

    #[test]
    fn snapshot_usage_is_recomputed_not_trusted() {
        let mut stale = SelectedBasketItem::from_definition(&def("4032", 5), BasketType::Ongoing);
        stale.usage_count = 4;
        let ledger = BasketLedger::from_snapshot(vec![stale]);
        assert_eq!(ledger.get(BasketType::Ongoing, "4032").unwrap().usage_count, 0);
    }
}
