use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::StoredAttachment;
use super::enums::BasketType;

/// A billable procedure or test in a treatment basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketItemDefinition {
    pub code: String,
    pub description: String,
    pub coverage_limit: u32,
    #[serde(default)]
    pub specialists_covered: Option<String>,
}

/// Treatment protocol for one condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treatment {
    pub condition: String,
    #[serde(default)]
    pub diagnostic_basket: Vec<BasketItemDefinition>,
    #[serde(default)]
    pub ongoing_management_basket: Vec<BasketItemDefinition>,
}

impl Treatment {
    pub fn basket(&self, basket_type: BasketType) -> &[BasketItemDefinition] {
        match basket_type {
            BasketType::Diagnostic => &self.diagnostic_basket,
            BasketType::Ongoing => &self.ongoing_management_basket,
        }
    }

    pub fn find_item(&self, basket_type: BasketType, code: &str) -> Option<&BasketItemDefinition> {
        self.basket(basket_type).iter().find(|i| i.code == code)
    }
}

/// Clinician motivation attached to a selected basket item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDocumentation {
    pub note: String,
    #[serde(default)]
    pub files: Vec<StoredAttachment>,
    pub timestamp: DateTime<Utc>,
}

/// Case-scoped selection of a basket item.
///
/// `usage_count` is a cache of the encounter log; the ledger refreshes it
/// after every mutation and on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedBasketItem {
    pub code: String,
    pub description: String,
    pub coverage_limit: u32,
    #[serde(default)]
    pub specialists_covered: Option<String>,
    pub basket_type: BasketType,
    pub selected_quantity: u32,
    pub usage_count: u32,
    #[serde(default)]
    pub documentation: Option<ItemDocumentation>,
}

impl SelectedBasketItem {
    pub fn from_definition(def: &BasketItemDefinition, basket_type: BasketType) -> Self {
        Self {
            code: def.code.clone(),
            description: def.description.clone(),
            coverage_limit: def.coverage_limit,
            specialists_covered: def.specialists_covered.clone(),
            basket_type,
            selected_quantity: 0,
            usage_count: 0,
            documentation: None,
        }
    }

    pub fn definition(&self) -> BasketItemDefinition {
        BasketItemDefinition {
            code: self.code.clone(),
            description: self.description.clone(),
            coverage_limit: self.coverage_limit,
            specialists_covered: self.specialists_covered.clone(),
        }
    }

    /// Whether the quantity satisfies the advance guard: `0 < q <= limit`.
    pub fn has_valid_quantity(&self) -> bool {
        self.selected_quantity > 0 && self.selected_quantity <= self.coverage_limit
    }

    /// Units of coverage still available for encounters.
    pub fn remaining(&self) -> u32 {
        self.coverage_limit.saturating_sub(self.usage_count)
    }
}
