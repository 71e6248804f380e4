//! In-memory store.

use crate::{
    sample_uniform, AgentDirectory, BulkWriteResult, LeadFilter, LeadStore, LeadUpdate,
    LeadWriteOp,
};
use async_trait::async_trait;
use chrono::Utc;
use leadbook_core::{
    Agent, AgentId, EntityType, Lead, LeadId, LeadbookResult, StorageError,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// `RwLock`-guarded maps of leads and agents.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    leads: Arc<RwLock<HashMap<Uuid, Lead>>>,
    agents: Arc<RwLock<HashMap<Uuid, Agent>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored leads.
    pub fn lead_total(&self) -> LeadbookResult<usize> {
        Ok(self
            .leads
            .read()
            .map_err(|_| StorageError::LockPoisoned)?
            .len())
    }

    /// Write a lead document as-is, bypassing insert checks.
    ///
    /// Used to seed legacy or inconsistent documents.
    pub fn put_raw(&self, lead: Lead) -> LeadbookResult<()> {
        self.leads
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .insert(lead.id, lead);
        Ok(())
    }

    /// Remove everything.
    pub fn clear(&self) -> LeadbookResult<()> {
        self.leads
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .clear();
        self.agents
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .clear();
        Ok(())
    }

    fn matching(&self, filter: &LeadFilter) -> LeadbookResult<Vec<Lead>> {
        let leads = self.leads.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut found: Vec<Lead> = leads.values().filter(|l| filter.matches(l)).cloned().collect();
        found.sort_by_key(|l| l.id);
        Ok(found)
    }
}

#[async_trait]
impl LeadStore for InMemoryStore {
    async fn lead_insert(&self, lead: &Lead) -> LeadbookResult<()> {
        let mut leads = self.leads.write().map_err(|_| StorageError::LockPoisoned)?;
        if leads.contains_key(&lead.id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Lead,
                reason: "already exists".to_string(),
            }
            .into());
        }
        leads.insert(lead.id, lead.clone());
        Ok(())
    }

    async fn lead_get(&self, id: LeadId) -> LeadbookResult<Option<Lead>> {
        let leads = self.leads.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(leads.get(&id).cloned())
    }

    async fn lead_find(&self, filter: &LeadFilter) -> LeadbookResult<Vec<Lead>> {
        self.matching(filter)
    }

    async fn lead_update_many(
        &self,
        filter: &LeadFilter,
        update: &LeadUpdate,
    ) -> LeadbookResult<usize> {
        let mut leads = self.leads.write().map_err(|_| StorageError::LockPoisoned)?;
        let mut modified = 0;
        for lead in leads.values_mut().filter(|l| filter.matches(l)) {
            // A document the update cannot apply to is skipped, not fatal.
            if update.apply(lead).is_ok() {
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn lead_bulk_write(&self, ops: Vec<LeadWriteOp>) -> LeadbookResult<BulkWriteResult> {
        let mut leads = self.leads.write().map_err(|_| StorageError::LockPoisoned)?;
        let mut result = BulkWriteResult::default();
        for op in ops {
            let Some(lead) = leads.get_mut(&op.lead_id) else {
                result.record_failure(op.lead_id, "lead not found");
                continue;
            };
            result.matched += 1;
            match op.update.apply(lead) {
                Ok(()) => result.modified += 1,
                Err(e) => result.record_failure(op.lead_id, e.to_string()),
            }
        }
        Ok(result)
    }

    async fn lead_delete(&self, id: LeadId) -> LeadbookResult<bool> {
        let mut leads = self.leads.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(leads.remove(&id).is_some())
    }

    async fn lead_count(&self, filter: &LeadFilter) -> LeadbookResult<usize> {
        let leads = self.leads.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(leads.values().filter(|l| filter.matches(l)).count())
    }

    async fn lead_sample(&self, filter: &LeadFilter, size: usize) -> LeadbookResult<Vec<Lead>> {
        let candidates = self.matching(filter)?;
        Ok(sample_uniform(candidates, size))
    }
}

#[async_trait]
impl AgentDirectory for InMemoryStore {
    async fn agent_insert(&self, agent: &Agent) -> LeadbookResult<()> {
        let mut agents = self.agents.write().map_err(|_| StorageError::LockPoisoned)?;
        if agents.contains_key(&agent.id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Agent,
                reason: "already exists".to_string(),
            }
            .into());
        }
        agents.insert(agent.id, agent.clone());
        Ok(())
    }

    async fn agent_get(&self, id: AgentId) -> LeadbookResult<Option<Agent>> {
        let agents = self.agents.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(agents.get(&id).cloned())
    }

    async fn agent_list(&self) -> LeadbookResult<Vec<Agent>> {
        let agents = self.agents.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut all: Vec<Agent> = agents.values().cloned().collect();
        all.sort_by_key(|a| a.id);
        Ok(all)
    }

    async fn agent_set_assigned_count(&self, id: AgentId, count: u64) -> LeadbookResult<()> {
        let mut agents = self.agents.write().map_err(|_| StorageError::LockPoisoned)?;
        let agent = agents.get_mut(&id).ok_or(StorageError::NotFound {
            entity_type: EntityType::Agent,
            id,
        })?;
        agent.assigned_lead_count = count;
        agent.updated_at = Utc::now();
        Ok(())
    }

    async fn agent_delete(&self, id: AgentId) -> LeadbookResult<bool> {
        let mut agents = self.agents.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(agents.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadbook_core::{LeadStatus, LeadbookError};
    use std::collections::HashSet;

    fn lead(phone: &str) -> Lead {
        Lead::new("Lead", phone)
    }

    #[tokio::test]
    async fn test_lead_insert_get() {
        let store = InMemoryStore::new();
        let l = lead("9876543210");
        store.lead_insert(&l).await.unwrap();
        assert_eq!(store.lead_get(l.id).await.unwrap(), Some(l));
    }

    #[tokio::test]
    async fn test_sample_ignores_insertion_order() {
        let store = InMemoryStore::new();
        let mut ids = Vec::new();
        for i in 0..10 {
            let l = lead(&format!("90000000{:02}", i));
            ids.push(l.id);
            store.lead_insert(&l).await.unwrap();
        }
        ids.sort();
        let first_three: HashSet<LeadId> = ids[..3].iter().copied().collect();

        let mut seen = HashSet::new();
        let mut prefix_draws = 0;
        for _ in 0..200 {
            let picked: HashSet<LeadId> = store
                .lead_sample(&LeadFilter::new().unassigned(), 3)
                .await
                .unwrap()
                .into_iter()
                .map(|l| l.id)
                .collect();
            assert_eq!(picked.len(), 3);
            if picked == first_three {
                prefix_draws += 1;
            }
            seen.extend(picked);
        }
        assert_eq!(seen.len(), 10);
        assert!(prefix_draws < 200);
    }

    #[tokio::test]
    async fn test_lead_insert_duplicate() {
        let store = InMemoryStore::new();
        let l = lead("9876543210");
        store.lead_insert(&l).await.unwrap();
        let err = store.lead_insert(&l).await.unwrap_err();
        assert!(matches!(
            err,
            LeadbookError::Storage(StorageError::InsertFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_many_only_touches_matches() {
        let store = InMemoryStore::new();
        let a = lead("9000000001").with_status(LeadStatus::Interested, None);
        let b = lead("9000000002");
        store.lead_insert(&a).await.unwrap();
        store.lead_insert(&b).await.unwrap();

        let agent = Uuid::now_v7();
        let modified = store
            .lead_update_many(
                &LeadFilter::new().status(LeadStatus::Interested),
                &LeadUpdate::assign(agent, "Priya", None, Utc::now()),
            )
            .await
            .unwrap();

        assert_eq!(modified, 1);
        assert!(store.lead_get(a.id).await.unwrap().unwrap().is_assigned_to(agent));
        assert!(store.lead_get(b.id).await.unwrap().unwrap().is_unassigned());
    }

    #[tokio::test]
    async fn test_bulk_write_failures_do_not_block_siblings() {
        let store = InMemoryStore::new();
        let good = lead("9000000001");
        let bad = lead("9000000002");
        store.lead_insert(&good).await.unwrap();
        store.lead_insert(&bad).await.unwrap();
        let missing = Uuid::now_v7();

        let ops = vec![
            LeadWriteOp::new(bad.id, LeadUpdate::clear_assignment().close_history_entry(0, Utc::now())),
            LeadWriteOp::new(missing, LeadUpdate::clear_assignment()),
            LeadWriteOp::new(good.id, LeadUpdate::assign(Uuid::now_v7(), "Priya", None, Utc::now())),
        ];
        let result = store.lead_bulk_write(ops).await.unwrap();

        assert_eq!(result.matched, 2);
        assert_eq!(result.modified, 1);
        assert_eq!(result.failures.len(), 2);
        assert!(store.lead_get(good.id).await.unwrap().unwrap().is_assigned);
    }

    #[tokio::test]
    async fn test_sample_respects_filter() {
        let store = InMemoryStore::new();
        let agent = Uuid::now_v7();
        for i in 0..20 {
            let mut l = lead(&format!("90000000{:02}", i));
            if i % 2 == 0 {
                l.is_assigned = true;
                l.assigned_to = Some(agent);
            }
            store.lead_insert(&l).await.unwrap();
        }

        let filter = LeadFilter::new().unassigned();
        assert_eq!(store.lead_count(&filter).await.unwrap(), 10);
        let picked = store.lead_sample(&filter, 4).await.unwrap();
        assert_eq!(picked.len(), 4);
        assert!(picked.iter().all(|l| l.is_unassigned()));

        let all = store.lead_sample(&filter, 50).await.unwrap();
        assert_eq!(all.len(), 10);
    }

    #[tokio::test]
    async fn test_agent_crud() {
        let store = InMemoryStore::new();
        let agent = Agent::new("Priya", "priya@example.com");
        store.agent_insert(&agent).await.unwrap();

        store.agent_set_assigned_count(agent.id, 7).await.unwrap();
        assert_eq!(
            store.agent_get(agent.id).await.unwrap().unwrap().assigned_lead_count,
            7
        );

        assert_eq!(store.agent_list().await.unwrap()[0].name, "Priya");

        assert!(store.agent_delete(agent.id).await.unwrap());
        assert!(!store.agent_delete(agent.id).await.unwrap());
        assert!(store.agent_set_assigned_count(agent.id, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_put_raw_and_clear() {
        let store = InMemoryStore::new();
        let mut l = lead("9000000001");
        l.is_assigned = true;
        store.put_raw(l.clone()).unwrap();
        assert_eq!(store.lead_total().unwrap(), 1);
        store.clear().unwrap();
        assert_eq!(store.lead_total().unwrap(), 0);
    }
}
