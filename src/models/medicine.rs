use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::enums::Plan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub condition: String,
    pub medicine_class: String,
    pub active_ingredient: String,
    pub medicine_name_strength: String,
    /// Chronic drug amount for Core, Priority and Saver plans.
    pub cda_core_priority_saver: String,
    /// Chronic drug amount for Executive and Comprehensive plans.
    pub cda_executive_comprehensive: String,
    #[serde(default)]
    pub plans_excluded: BTreeSet<Plan>,
}

impl Medicine {
    pub fn is_available_under(&self, plan: Plan) -> bool {
        !self.plans_excluded.contains(&plan)
    }

    /// Chronic drug amount that applies to the given plan.
    pub fn cda_for(&self, plan: Plan) -> &str {
        match plan {
            Plan::Executive | Plan::Comprehensive => &self.cda_executive_comprehensive,
            _ => &self.cda_core_priority_saver,
        }
    }
}

/// A medicine annotated with its availability under the active plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineAvailability {
    pub medicine: Medicine,
    pub available: bool,
    pub selected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metformin(excluded: &[Plan]) -> Medicine {
        Medicine {
            condition: "Diabetes Mellitus Type 2".into(),
            medicine_class: "Biguanides".into(),
            active_ingredient: "Metformin".into(),
            medicine_name_strength: "Glucophage 500mg".into(),
            cda_core_priority_saver: "R 210".into(),
            cda_executive_comprehensive: "R 380".into(),
            plans_excluded: excluded.iter().copied().collect(),
        }
    }

    #[test]
    fn availability_is_plan_exclusion() {
        let med = metformin(&[Plan::KeyCare]);
        assert!(!med.is_available_under(Plan::KeyCare));
        assert!(med.is_available_under(Plan::Comprehensive));
    }

    #[test]
    fn cda_tier_follows_plan() {
        let med = metformin(&[]);
        assert_eq!(med.cda_for(Plan::Executive), "R 380");
        assert_eq!(med.cda_for(Plan::Saver), "R 210");
    }

    #[test]
    fn missing_exclusions_default_to_empty() {
        let json = r#"{"condition":"Asthma","medicine_class":"ICS","active_ingredient":"Budesonide",
            "medicine_name_strength":"Pulmicort 200mcg","cda_core_priority_saver":"R 150",
            "cda_executive_comprehensive":"R 300"}"#;
        let med: Medicine = serde_json::from_str(json).unwrap();
        assert!(med.plans_excluded.is_empty());
    }
}
