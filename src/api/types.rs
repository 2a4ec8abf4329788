//! Shared types for the HTTP layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::claim::CaseView;
use crate::core_state::CoreState;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// ═══════════════════════════════════════════════════════════
// Common bodies
// ═══════════════════════════════════════════════════════════

/// Body carrying a single basket, ICD or encounter code.
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

/// Result of a mutation plus the case as it now stands.
#[derive(Debug, Serialize)]
pub struct CaseResponse<T: Serialize> {
    pub result: T,
    pub case: CaseView,
}
