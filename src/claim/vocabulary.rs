//! Built-in detection vocabulary for the chronic disease list.
//!
//! Each phrase scores its word count per whole-word match. Conditions are
//! listed in catalog order, which breaks score ties.

/// `(condition name, weighted phrases)`, in catalog order.
pub const CONDITION_VOCABULARY: &[(&str, &[&str])] = &[
    (
        "Addison's Disease",
        &[
            "addison's disease",
            "addisons disease",
            "adrenal insufficiency",
            "hydrocortisone",
            "fludrocortisone",
            "hyperpigmentation",
            "synacthen test",
        ],
    ),
    (
        "Asthma",
        &[
            "asthma",
            "wheezing",
            "wheeze",
            "inhaler",
            "salbutamol",
            "budesonide",
            "peak flow",
            "bronchospasm",
        ],
    ),
    (
        "Bipolar Mood Disorder",
        &[
            "bipolar",
            "bipolar mood disorder",
            "mania",
            "manic episode",
            "hypomania",
            "lithium",
            "mood stabiliser",
            "mood stabilizer",
        ],
    ),
    (
        "Bronchiectasis",
        &[
            "bronchiectasis",
            "chronic productive cough",
            "purulent sputum",
            "airway clearance",
        ],
    ),
    (
        "Cardiac Failure",
        &[
            "cardiac failure",
            "heart failure",
            "congestive heart failure",
            "ejection fraction",
            "pedal oedema",
            "orthopnoea",
            "furosemide",
        ],
    ),
    (
        "Cardiomyopathy",
        &[
            "cardiomyopathy",
            "dilated cardiomyopathy",
            "hypertrophic cardiomyopathy",
            "ventricular hypertrophy",
        ],
    ),
    (
        "Chronic Obstructive Pulmonary Disease",
        &[
            "copd",
            "chronic obstructive pulmonary disease",
            "emphysema",
            "chronic bronchitis",
            "tiotropium",
            "spirometry",
        ],
    ),
    (
        "Chronic Renal Disease",
        &[
            "chronic renal disease",
            "chronic kidney disease",
            "ckd",
            "renal failure",
            "egfr",
            "creatinine",
            "proteinuria",
            "dialysis",
        ],
    ),
    (
        "Coronary Artery Disease",
        &[
            "coronary artery disease",
            "angina",
            "myocardial infarction",
            "ischaemic heart disease",
            "coronary stent",
            "troponin",
        ],
    ),
    (
        "Crohn's Disease",
        &[
            "crohn's disease",
            "crohns disease",
            "terminal ileitis",
            "perianal fistula",
        ],
    ),
    (
        "Diabetes Insipidus",
        &[
            "diabetes insipidus",
            "polyuria",
            "polydipsia",
            "excessive thirst",
            "desmopressin",
            "dilute urine",
            "water deprivation test",
        ],
    ),
    (
        "Diabetes Mellitus Type 1",
        &[
            "type 1 diabetes",
            "diabetes mellitus type 1",
            "insulin dependent",
            "diabetic ketoacidosis",
            "insulin pump",
            "basal bolus",
        ],
    ),
    (
        "Diabetes Mellitus Type 2",
        &[
            "type 2 diabetes",
            "diabetes mellitus type 2",
            "metformin",
            "hba1c",
            "hyperglycaemia",
            "hyperglycemia",
            "gliclazide",
            "blood glucose",
        ],
    ),
    (
        "Dysrhythmias",
        &[
            "dysrhythmia",
            "arrhythmia",
            "atrial fibrillation",
            "palpitations",
            "warfarin",
            "amiodarone",
        ],
    ),
    (
        "Epilepsy",
        &[
            "epilepsy",
            "seizure",
            "seizures",
            "convulsions",
            "anticonvulsant",
            "valproate",
            "carbamazepine",
            "lamotrigine",
        ],
    ),
    (
        "Glaucoma",
        &[
            "glaucoma",
            "intraocular pressure",
            "timolol",
            "latanoprost",
            "optic disc cupping",
        ],
    ),
    (
        "Haemophilia",
        &[
            "haemophilia",
            "hemophilia",
            "factor viii",
            "factor ix",
            "haemarthrosis",
            "clotting factor",
        ],
    ),
    (
        "HIV",
        &[
            "hiv",
            "antiretroviral",
            "viral load",
            "cd4 count",
            "tenofovir",
            "dolutegravir",
        ],
    ),
    (
        "Hyperlipidaemia",
        &[
            "hyperlipidaemia",
            "hyperlipidemia",
            "hypercholesterolaemia",
            "high cholesterol",
            "ldl cholesterol",
            "statin",
            "atorvastatin",
            "simvastatin",
            "lipid profile",
        ],
    ),
    (
        "Hypertension",
        &[
            "hypertension",
            "high blood pressure",
            "elevated blood pressure",
            "amlodipine",
            "enalapril",
            "hydrochlorothiazide",
            "perindopril",
        ],
    ),
    (
        "Hypothyroidism",
        &[
            "hypothyroidism",
            "underactive thyroid",
            "levothyroxine",
            "thyroxine",
            "elevated tsh",
        ],
    ),
    (
        "Multiple Sclerosis",
        &[
            "multiple sclerosis",
            "demyelination",
            "optic neuritis",
            "interferon beta",
            "relapsing remitting",
        ],
    ),
    (
        "Parkinson's Disease",
        &[
            "parkinson's disease",
            "parkinsons disease",
            "resting tremor",
            "bradykinesia",
            "levodopa",
            "carbidopa",
        ],
    ),
    (
        "Rheumatoid Arthritis",
        &[
            "rheumatoid arthritis",
            "rheumatoid factor",
            "methotrexate",
            "synovitis",
            "morning stiffness",
        ],
    ),
    (
        "Schizophrenia",
        &[
            "schizophrenia",
            "psychosis",
            "hallucinations",
            "delusions",
            "antipsychotic",
            "risperidone",
            "olanzapine",
            "clozapine",
        ],
    ),
    (
        "Systemic Lupus Erythematosus",
        &[
            "systemic lupus erythematosus",
            "lupus",
            "sle",
            "malar rash",
            "hydroxychloroquine",
        ],
    ),
    (
        "Ulcerative Colitis",
        &[
            "ulcerative colitis",
            "bloody diarrhoea",
            "mesalazine",
            "sulfasalazine",
        ],
    ),
];

/// Generic clinical terms. A note mentioning any of these is in-domain even
/// when no condition phrase matches.
pub const DOMAIN_TERMS: &[&str] = &[
    "patient",
    "pt",
    "diagnosis",
    "diagnosed",
    "chronic",
    "symptom",
    "symptoms",
    "medication",
    "medications",
    "treatment",
    "clinical",
    "presents",
    "presented",
    "complains",
    "examination",
    "prescribed",
    "started on",
    "follow up",
    "disease",
    "condition",
    "therapy",
    "mg",
];

/// Look up the built-in phrases for a condition (case-insensitive).
pub fn phrases_for(condition: &str) -> Option<&'static [&'static str]> {
    CONDITION_VOCABULARY
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(condition))
        .map(|(_, phrases)| *phrases)
}
