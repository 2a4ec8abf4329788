use serde::{Deserialize, Serialize};

/// One ICD-10 row of reference data. Many rows share `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub icd_code: String,
    pub icd_description: String,
}
