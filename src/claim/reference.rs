use std::collections::HashSet;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::models::enums::BasketType;
use crate::models::{BasketItemDefinition, Condition, Medicine, Treatment};

const CONDITIONS_FILE: &str = "conditions.json";
const TREATMENTS_FILE: &str = "treatments.json";
const MEDICINES_FILE: &str = "medicines.json";

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("Failed to read reference data {0}: {1}")]
    Load(String, String),
    #[error("Failed to parse reference data {0}: {1}")]
    Parse(String, String),
    #[error("Invalid reference data: {0}")]
    Invalid(String),
}

/// Read-only lookup: condition → ICD codes, treatment baskets, medicines.
///
/// Loaded once at startup. All lookups by condition name are
/// case-insensitive; "catalog order" is the order conditions first appear
/// in conditions.json.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    conditions: Vec<Condition>,
    treatments: Vec<Treatment>,
    medicines: Vec<Medicine>,
}

impl ReferenceCatalog {
    pub fn new(
        conditions: Vec<Condition>,
        treatments: Vec<Treatment>,
        medicines: Vec<Medicine>,
    ) -> Result<Self, ReferenceError> {
        let catalog = Self {
            conditions,
            treatments,
            medicines,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load reference data from the three JSON files in `dir`.
    pub fn load(dir: &Path) -> Result<Self, ReferenceError> {
        let conditions = read_json(dir, CONDITIONS_FILE)?;
        let treatments = read_json(dir, TREATMENTS_FILE)?;
        let medicines = read_json(dir, MEDICINES_FILE)?;
        let catalog = Self::new(conditions, treatments, medicines)?;
        tracing::info!(
            dir = %dir.display(),
            conditions = catalog.condition_names().len(),
            medicines = catalog.medicines.len(),
            "Reference catalog loaded"
        );
        Ok(catalog)
    }

    /// Reference data shipped with the binary.
    pub fn bundled() -> Result<Self, ReferenceError> {
        let conditions = parse_json(
            CONDITIONS_FILE,
            include_str!("../../resources/reference/conditions.json"),
        )?;
        let treatments = parse_json(
            TREATMENTS_FILE,
            include_str!("../../resources/reference/treatments.json"),
        )?;
        let medicines = parse_json(
            MEDICINES_FILE,
            include_str!("../../resources/reference/medicines.json"),
        )?;
        Self::new(conditions, treatments, medicines)
    }

    /// Load from `dir` when it exists, otherwise fall back to the bundled data.
    pub fn load_or_bundled(dir: &Path) -> Result<Self, ReferenceError> {
        if dir.join(CONDITIONS_FILE).exists() {
            Self::load(dir)
        } else {
            tracing::info!(dir = %dir.display(), "No reference directory, using bundled data");
            Self::bundled()
        }
    }

    fn validate(&self) -> Result<(), ReferenceError> {
        let mut seen = HashSet::new();
        for t in &self.treatments {
            if !seen.insert(t.condition.to_lowercase()) {
                return Err(ReferenceError::Invalid(format!(
                    "duplicate treatment for {}",
                    t.condition
                )));
            }
            for basket_type in [BasketType::Diagnostic, BasketType::Ongoing] {
                let mut codes = HashSet::new();
                for item in t.basket(basket_type) {
                    if !codes.insert(item.code.as_str()) {
                        return Err(ReferenceError::Invalid(format!(
                            "duplicate {basket_type} basket code {} for {}",
                            item.code, t.condition
                        )));
                    }
                }
            }
            if !self.has_condition(&t.condition) {
                tracing::warn!(condition = %t.condition, "Treatment for a condition with no ICD codes");
            }
        }
        Ok(())
    }

    /// Distinct condition names in catalog order.
    pub fn condition_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.conditions
            .iter()
            .filter(|c| seen.insert(c.name.to_lowercase()))
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.iter().any(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Canonical spelling of a condition name.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.conditions
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.name.as_str())
    }

    pub fn codes_for(&self, condition: &str) -> Vec<Condition> {
        self.conditions
            .iter()
            .filter(|c| c.name.eq_ignore_ascii_case(condition))
            .cloned()
            .collect()
    }

    pub fn treatment_for(&self, condition: &str) -> Option<&Treatment> {
        self.treatments
            .iter()
            .find(|t| t.condition.eq_ignore_ascii_case(condition))
    }

    pub fn medicines_for(&self, condition: &str) -> Vec<Medicine> {
        self.medicines
            .iter()
            .filter(|m| m.condition.eq_ignore_ascii_case(condition))
            .cloned()
            .collect()
    }

    pub fn find_icd(&self, condition: &str, icd_code: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| {
            c.name.eq_ignore_ascii_case(condition) && c.icd_code.eq_ignore_ascii_case(icd_code)
        })
    }

    pub fn find_basket_item(
        &self,
        condition: &str,
        basket_type: BasketType,
        code: &str,
    ) -> Option<&BasketItemDefinition> {
        self.treatment_for(condition)?.find_item(basket_type, code)
    }

    pub fn find_medicine(&self, condition: &str, name_strength: &str) -> Option<&Medicine> {
        self.medicines.iter().find(|m| {
            m.condition.eq_ignore_ascii_case(condition)
                && m.medicine_name_strength.eq_ignore_ascii_case(name_strength)
        })
    }

    /// Small fixed catalog for tests (no file I/O).
    pub fn load_test() -> Self {
        use crate::models::enums::Plan;

        fn icd(name: &str, code: &str, description: &str) -> Condition {
            Condition {
                name: name.into(),
                icd_code: code.into(),
                icd_description: description.into(),
            }
        }

        fn item(code: &str, description: &str, limit: u32, specialists: Option<&str>) -> BasketItemDefinition {
            BasketItemDefinition {
                code: code.into(),
                description: description.into(),
                coverage_limit: limit,
                specialists_covered: specialists.map(Into::into),
            }
        }

        fn med(condition: &str, ingredient: &str, name: &str, excluded: &[Plan]) -> Medicine {
            Medicine {
                condition: condition.into(),
                medicine_class: "Test class".into(),
                active_ingredient: ingredient.into(),
                medicine_name_strength: name.into(),
                cda_core_priority_saver: "R 200".into(),
                cda_executive_comprehensive: "R 400".into(),
                plans_excluded: excluded.iter().copied().collect(),
            }
        }

        Self {
            conditions: vec![
                icd("Diabetes Insipidus", "E23.2", "Diabetes insipidus"),
                icd("Diabetes Insipidus", "N25.1", "Nephrogenic diabetes insipidus"),
                icd("Diabetes Mellitus Type 2", "E11.9", "Type 2 diabetes mellitus without complications"),
                icd("Hypertension", "I10", "Essential (primary) hypertension"),
                icd("Asthma", "J45.9", "Asthma, unspecified"),
            ],
            treatments: vec![
                Treatment {
                    condition: "Diabetes Insipidus".into(),
                    diagnostic_basket: vec![
                        item("4032", "Urea and electrolytes", 1, None),
                        item("4171", "Plasma osmolality", 4, None),
                        item("3608", "MRI pituitary", 1, Some("Radiologist")),
                    ],
                    ongoing_management_basket: vec![
                        item("4032", "Urea and electrolytes", 2, None),
                        item("0190", "Specialist consultation", 4, Some("Endocrinologist")),
                        item("4188", "Urine osmolality", 0, None),
                    ],
                },
                Treatment {
                    condition: "Diabetes Mellitus Type 2".into(),
                    diagnostic_basket: vec![item("4050", "HbA1c", 1, None)],
                    ongoing_management_basket: vec![item("4050", "HbA1c", 4, None)],
                },
                Treatment {
                    condition: "Hypertension".into(),
                    diagnostic_basket: vec![item("1232", "ECG", 1, None)],
                    ongoing_management_basket: vec![item("0190", "GP consultation", 3, None)],
                },
            ],
            medicines: vec![
                med("Diabetes Insipidus", "Desmopressin", "Minirin 0.1mg", &[]),
                med("Diabetes Insipidus", "Desmopressin", "Desmopressin Teva 0.2mg", &[Plan::KeyCare]),
                med("Diabetes Mellitus Type 2", "Metformin", "Glucophage 500mg", &[]),
                med("Hypertension", "Amlodipine", "Amloc 5mg", &[]),
            ],
        }
    }
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T, ReferenceError> {
    let path = dir.join(file);
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| ReferenceError::Load(path.display().to_string(), e.to_string()))?;
    parse_json(file, &raw)
}

fn parse_json<T: DeserializeOwned>(file: &str, raw: &str) -> Result<T, ReferenceError> {
    serde_json::from_str(raw).map_err(|e| ReferenceError::Parse(file.into(), e.to_string()))
}
