//! Leadbook Storage - Lead Store and Agent Directory
//!
//! Defines the persistence contract the engine works against and two
//! backends: [`InMemoryStore`] and the LMDB-backed [`LmdbStore`].
//!
//! Bulk writes are batches of independent per-document writes. There is no
//! cross-document transaction; one document failing never blocks another.

pub mod filter;
pub mod lmdb;
pub mod memory;
pub mod update;

pub use filter::{AssignedToFilter, LeadFilter};
pub use lmdb::{LmdbStore, LmdbStoreError};
pub use memory::InMemoryStore;
pub use update::{BulkWriteResult, LeadUpdate, LeadWriteOp, WriteFailure};

use async_trait::async_trait;
use leadbook_core::{Agent, AgentId, Lead, LeadId, LeadbookResult};

// ============================================================================
// LEAD STORE
// ============================================================================

/// Persistence contract for lead documents.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Insert a new lead. Fails if the id already exists.
    async fn lead_insert(&self, lead: &Lead) -> LeadbookResult<()>;

    /// Get a lead by id.
    async fn lead_get(&self, id: LeadId) -> LeadbookResult<Option<Lead>>;

    /// Find all leads matching the filter, ordered by id.
    async fn lead_find(&self, filter: &LeadFilter) -> LeadbookResult<Vec<Lead>>;

    /// Apply the same update to every matching lead.
    ///
    /// Returns the number of documents modified.
    async fn lead_update_many(&self, filter: &LeadFilter, update: &LeadUpdate)
        -> LeadbookResult<usize>;

    /// Apply heterogeneous per-document updates.
    async fn lead_bulk_write(&self, ops: Vec<LeadWriteOp>) -> LeadbookResult<BulkWriteResult>;

    /// Delete a lead. Returns whether it existed.
    async fn lead_delete(&self, id: LeadId) -> LeadbookResult<bool>;

    /// Count leads matching the filter.
    async fn lead_count(&self, filter: &LeadFilter) -> LeadbookResult<usize>;

    /// Uniform random sample of up to `size` matching leads.
    async fn lead_sample(&self, filter: &LeadFilter, size: usize) -> LeadbookResult<Vec<Lead>>;
}

// ============================================================================
// AGENT DIRECTORY
// ============================================================================

/// Persistence contract for agent records.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn agent_insert(&self, agent: &Agent) -> LeadbookResult<()>;

    async fn agent_get(&self, id: AgentId) -> LeadbookResult<Option<Agent>>;

    /// All agents, ordered by id.
    async fn agent_list(&self) -> LeadbookResult<Vec<Agent>>;

    /// Write the cached assigned-lead count.
    async fn agent_set_assigned_count(&self, id: AgentId, count: u64) -> LeadbookResult<()>;

    /// Delete an agent. Returns whether it existed.
    async fn agent_delete(&self, id: AgentId) -> LeadbookResult<bool>;
}

/// A backend providing both leads and agents.
pub trait LeadbookStore: LeadStore + AgentDirectory {}

impl<T: LeadStore + AgentDirectory> LeadbookStore for T {}

/// Pick `size` of `items` uniformly at random.
pub(crate) fn sample_uniform<T>(mut items: Vec<T>, size: usize) -> Vec<T> {
    if size >= items.len() {
        return items;
    }
    let mut picked = rand::seq::index::sample(&mut rand::rng(), items.len(), size).into_vec();
    // Remove from the back so earlier indices stay valid.
    picked.sort_unstable_by(|a, b| b.cmp(a));
    let mut out: Vec<T> = picked.into_iter().map(|i| items.swap_remove(i)).collect();
    out.reverse();
    out
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        /// Sampling returns min(size, len) distinct members of the population.
        #[test]
        fn prop_sample_is_subset(len in 0usize..200, size in 0usize..250) {
            let items: Vec<usize> = (0..len).collect();
            let picked = sample_uniform(items, size);
            prop_assert_eq!(picked.len(), size.min(len));
            let unique: HashSet<_> = picked.iter().copied().collect();
            prop_assert_eq!(unique.len(), picked.len());
            prop_assert!(picked.iter().all(|v| *v < len));
        }
    }
}
