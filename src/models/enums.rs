use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same snake_case strings as the database columns.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(CaseStatus {
    Active => "active",
    Completed => "completed",
    Archived => "archived",
});

str_enum!(BasketType {
    Diagnostic => "diagnostic",
    Ongoing => "ongoing",
});

str_enum!(ActivityType {
    SpecialistVisit => "specialist_visit",
    DiagnosticTest => "diagnostic_test",
    FollowUp => "follow_up",
    Other => "other",
});

str_enum!(Plan {
    KeyCare => "key_care",
    Core => "core",
    Saver => "saver",
    Priority => "priority",
    Classic => "classic",
    Essential => "essential",
    Comprehensive => "comprehensive",
    Executive => "executive",
});

str_enum!(ReferralStatus {
    Draft => "draft",
    Sent => "sent",
    Acknowledged => "acknowledged",
    Cancelled => "cancelled",
});

str_enum!(UrgencyLevel {
    Routine => "routine",
    Urgent => "urgent",
    Emergency => "emergency",
});

str_enum!(WorkflowStep {
    NoteEntry => "note_entry",
    ConditionConfirmed => "condition_confirmed",
    CodesSelected => "codes_selected",
    DiagnosticBasket => "diagnostic_basket",
    OngoingBasket => "ongoing_basket",
    MedicationsSelected => "medications_selected",
    Finalized => "finalized",
});

impl Plan {
    pub const ALL: [Plan; 8] = [
        Plan::KeyCare,
        Plan::Core,
        Plan::Saver,
        Plan::Priority,
        Plan::Classic,
        Plan::Essential,
        Plan::Comprehensive,
        Plan::Executive,
    ];

    /// Payer-facing plan name.
    pub fn label(&self) -> &'static str {
        match self {
            Plan::KeyCare => "KeyCare",
            Plan::Core => "Core",
            Plan::Saver => "Saver",
            Plan::Priority => "Priority",
            Plan::Classic => "Classic",
            Plan::Essential => "Essential",
            Plan::Comprehensive => "Comprehensive",
            Plan::Executive => "Executive",
        }
    }
}

impl Default for Plan {
    fn default() -> Self {
        Plan::Comprehensive
    }
}

impl WorkflowStep {
    /// Steps in wizard order.
    pub const ORDER: [WorkflowStep; 7] = [
        WorkflowStep::NoteEntry,
        WorkflowStep::ConditionConfirmed,
        WorkflowStep::CodesSelected,
        WorkflowStep::DiagnosticBasket,
        WorkflowStep::OngoingBasket,
        WorkflowStep::MedicationsSelected,
        WorkflowStep::Finalized,
    ];

    pub fn index(&self) -> usize {
        Self::ORDER
            .iter()
            .position(|s| s == self)
            .unwrap_or_default()
    }

    pub fn next(&self) -> Option<WorkflowStep> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    pub fn previous(&self) -> Option<WorkflowStep> {
        self.index().checked_sub(1).map(|i| Self::ORDER[i])
    }

    /// The basket phase this step edits, if any.
    pub fn basket_phase(&self) -> Option<BasketType> {
        match self {
            WorkflowStep::DiagnosticBasket => Some(BasketType::Diagnostic),
            WorkflowStep::OngoingBasket => Some(BasketType::Ongoing),
            _ => None,
        }
    }
}
