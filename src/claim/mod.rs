//! Chronic claim core: condition detection, reference lookup, the basket
//! coverage ledger and the case workflow built on them.

pub mod detection;
pub mod export;
pub mod ledger;
pub mod messages;
pub mod reference;
pub mod referral;
pub mod types;
pub mod vocabulary;
pub mod workflow;

pub use detection::ConditionDetector;
pub use export::{ClaimDocument, UsageSummary};
pub use ledger::{BasketLedger, EncounterKey, UsageEntry};
pub use reference::{ReferenceCatalog, ReferenceError};
pub use types::*;
pub use workflow::{CaseView, CaseWorkflow, CompletedEncounter, EncounterDetails, EncounterDraft};
