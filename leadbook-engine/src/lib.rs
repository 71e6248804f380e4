//! Leadbook Engine - Lead Assignment and Consistency
//!
//! Operations over an injected [`LeadbookStore`]:
//! - Specific and random assignment with history-based deduplication
//! - Bulk unassignment
//! - Phone-duplicate and flag/reference consistency auditing and repair
//! - Agent directory and lead maintenance
//!
//! The engine holds no state beyond the store handle and its limits. Bulk
//! writes are batches of independent per-document writes; concurrent readers
//! can observe a partially applied batch.

pub mod assign;
pub mod audit;
pub mod directory;
pub mod leads;
pub mod outcome;
pub mod unassign;

pub use audit::FixType;
pub use leads::NewLead;
pub use outcome::{
    AgentDuplicateReport, AssignRandomOutcome, AssignSpecificOutcome, DetectReport, DetectSummary,
    InconsistentLead, LeadRef, PhoneDuplicateGroup, RepairOutcome, RepeatedHistory,
    UnassignOutcome, UnassignedLead,
};

use leadbook_core::AssignmentConfig;
use leadbook_storage::LeadbookStore;
use std::sync::Arc;

/// Entry point for every lead/agent operation.
#[derive(Clone)]
pub struct LeadEngine {
    store: Arc<dyn LeadbookStore>,
    config: AssignmentConfig,
}

impl std::fmt::Debug for LeadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LeadEngine {
    pub fn new(store: Arc<dyn LeadbookStore>, config: AssignmentConfig) -> Self {
        Self { store, config }
    }

    /// Engine with default limits.
    pub fn with_store(store: Arc<dyn LeadbookStore>) -> Self {
        Self::new(store, AssignmentConfig::default())
    }

    pub fn store(&self) -> &Arc<dyn LeadbookStore> {
        &self.store
    }

    pub fn config(&self) -> &AssignmentConfig {
        &self.config
    }
}

/// "1 lead" / "3 leads".
pub(crate) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
