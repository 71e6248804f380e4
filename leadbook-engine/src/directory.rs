//! Agent directory operations.
//!
//! The assigned-lead count on an agent record is a cache; every write of it
//! comes from a fresh count against the lead store.

use leadbook_core::{
    Agent, AgentId, AgentRole, AssignmentError, EntityType, LeadbookError, LeadbookResult,
    StorageError,
};
use leadbook_storage::{AgentDirectory, LeadFilter, LeadStore};

use crate::LeadEngine;

impl LeadEngine {
    /// Resolve an assignable agent, or `AgentNotFound`.
    pub(crate) async fn resolve_agent(&self, agent_id: AgentId) -> LeadbookResult<Agent> {
        match self.store.agent_get(agent_id).await? {
            Some(agent) if agent.is_assignable() => Ok(agent),
            _ => Err(AssignmentError::AgentNotFound { agent_id }.into()),
        }
    }

    /// Live count of leads currently held by `agent_id`.
    pub async fn live_assigned_count(&self, agent_id: AgentId) -> LeadbookResult<u64> {
        let count = self
            .store
            .lead_count(&LeadFilter::new().held_by(agent_id))
            .await?;
        Ok(count as u64)
    }

    /// Re-count the agent's leads and persist the cached count.
    pub async fn refresh_assigned_count(&self, agent_id: AgentId) -> LeadbookResult<u64> {
        let count = self.live_assigned_count(agent_id).await?;
        match self.store.agent_set_assigned_count(agent_id, count).await {
            Ok(()) => {}
            // The agent may have been removed mid-operation; the lead store stays authoritative.
            Err(LeadbookError::Storage(StorageError::NotFound { .. })) => {
                tracing::warn!(agent_id = %agent_id, "Agent vanished before count refresh");
            }
            Err(e) => return Err(e),
        }
        tracing::debug!(agent_id = %agent_id, count, "Refreshed assigned lead count");
        Ok(count)
    }

    #[tracing::instrument(skip(self, email, phone))]
    pub async fn register_agent(
        &self,
        name: String,
        email: String,
        phone: Option<String>,
        role: Option<AgentRole>,
    ) -> LeadbookResult<Agent> {
        let mut agent = Agent::new(name.trim(), email.trim()).with_role(role.unwrap_or_default());
        agent.phone = phone;
        agent.validate()?;
        self.store.agent_insert(&agent).await?;
        tracing::info!(agent_id = %agent.id, role = ?agent.role, "Registered agent");
        Ok(agent)
    }

    /// Agent by id with a freshly counted `assigned_lead_count`.
    pub async fn get_agent(&self, agent_id: AgentId) -> LeadbookResult<Agent> {
        let mut agent = self
            .store
            .agent_get(agent_id)
            .await?
            .ok_or(StorageError::NotFound {
                entity_type: EntityType::Agent,
                id: agent_id,
            })?;
        agent.assigned_lead_count = self.live_assigned_count(agent_id).await?;
        Ok(agent)
    }

    /// All agents, each with a freshly counted and persisted assigned count.
    pub async fn list_agents(&self) -> LeadbookResult<Vec<Agent>> {
        let mut agents = self.store.agent_list().await?;
        for agent in &mut agents {
            agent.assigned_lead_count = self.refresh_assigned_count(agent.id).await?;
        }
        Ok(agents)
    }

    /// Delete an agent that holds no leads.
    #[tracing::instrument(skip(self))]
    pub async fn delete_agent(&self, agent_id: AgentId) -> LeadbookResult<()> {
        if self.store.agent_get(agent_id).await?.is_none() {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Agent,
                id: agent_id,
            }
            .into());
        }
        let count = self.live_assigned_count(agent_id).await?;
        if count > 0 {
            return Err(AssignmentError::AgentHasAssignments { agent_id, count }.into());
        }
        self.store.agent_delete(agent_id).await?;
        tracing::info!(agent_id = %agent_id, "Deleted agent");
        Ok(())
    }
}
