//! Lead intake and maintenance. None of these touch assignment fields.

use leadbook_core::{
    EntityType, Lead, LeadId, LeadStatus, LeadbookResult, StorageError, ValidationError,
};
use leadbook_storage::{LeadFilter, LeadStore, LeadUpdate};
use serde::{Deserialize, Serialize};

use crate::LeadEngine;

/// Intake payload for a new lead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub interested_location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sub_status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn parse_status(raw: Option<&str>) -> Result<Option<LeadStatus>, ValidationError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse().map(Some),
        None => Ok(None),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl LeadEngine {
    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_lead(&self, new: NewLead) -> LeadbookResult<Lead> {
        let status = parse_status(new.status.as_deref())?.unwrap_or_default();
        let mut lead = Lead::new(new.name.trim(), new.phone.trim())
            .with_status(status, non_empty(new.sub_status));
        lead.email = non_empty(new.email);
        lead.interested_location = non_empty(new.interested_location);
        lead.notes = new.notes;
        lead.validate()?;

        self.store.lead_insert(&lead).await?;
        tracing::info!(lead_id = %lead.id, status = %lead.status, "Created lead");
        Ok(lead)
    }

    pub async fn get_lead(&self, lead_id: LeadId) -> LeadbookResult<Lead> {
        self.store
            .lead_get(lead_id)
            .await?
            .ok_or_else(|| lead_not_found(lead_id).into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_lead(&self, lead_id: LeadId) -> LeadbookResult<()> {
        let lead = self.get_lead(lead_id).await?;
        self.store.lead_delete(lead_id).await?;
        if let Some(agent_id) = lead.assigned_to.filter(|_| lead.is_assigned) {
            self.refresh_assigned_count(agent_id).await?;
        }
        tracing::info!(lead_id = %lead_id, "Deleted lead");
        Ok(())
    }

    /// Change status and substatus after validating the pair.
    #[tracing::instrument(skip(self))]
    pub async fn update_lead_status(
        &self,
        lead_id: LeadId,
        status: &str,
        sub_status: Option<String>,
    ) -> LeadbookResult<Lead> {
        let status = parse_status(Some(status))?.ok_or(ValidationError::RequiredFieldMissing {
            field: "status".to_string(),
        })?;
        let sub_status = non_empty(sub_status);
        status.validate_substatus(sub_status.as_deref())?;

        let modified = self
            .store
            .lead_update_many(
                &LeadFilter::new().ids([lead_id]),
                &LeadUpdate::set_status(status, sub_status),
            )
            .await?;
        if modified == 0 {
            return Err(lead_not_found(lead_id).into());
        }
        self.get_lead(lead_id).await
    }
}

fn lead_not_found(id: LeadId) -> StorageError {
    StorageError::NotFound {
        entity_type: EntityType::Lead,
        id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadbook_core::{Agent, LeadbookError};
    use leadbook_storage::{AgentDirectory, InMemoryStore};
    use std::sync::Arc;

    fn engine() -> (Arc<InMemoryStore>, LeadEngine) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), LeadEngine::with_store(store))
    }

    fn intake(phone: &str) -> NewLead {
        NewLead {
            name: "Asha".to_string(),
            phone: phone.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_lead_defaults() {
        let (_store, engine) = engine();
        let lead = engine.create_lead(intake("9876543210")).await.unwrap();
        assert_eq!(lead.status, LeadStatus::New);
        assert!(lead.is_unassigned());
        assert_eq!(engine.get_lead(lead.id).await.unwrap(), lead);
    }

    #[tokio::test]
    async fn test_create_lead_rejects_bad_phone_and_substatus() {
        let (store, engine) = engine();
        assert!(matches!(
            engine.create_lead(intake("12345")).await.unwrap_err(),
            LeadbookError::Validation(_)
        ));

        let mut bad_sub = intake("9876543210");
        bad_sub.status = Some("interested".to_string());
        bad_sub.sub_status = Some("booked".to_string());
        assert!(matches!(
            engine.create_lead(bad_sub).await.unwrap_err(),
            LeadbookError::Validation(_)
        ));
        assert_eq!(store.lead_total().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_status_keeps_assignment() {
        let (store, engine) = engine();
        let agent = Agent::new("Priya", "priya@example.com");
        store.agent_insert(&agent).await.unwrap();
        let lead = engine.create_lead(intake("9876543210")).await.unwrap();
        engine.assign_specific(&[lead.id], agent.id, None).await.unwrap();

        let updated = engine
            .update_lead_status(lead.id, "site-visit", Some("scheduled".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.status, LeadStatus::SiteVisit);
        assert_eq!(updated.sub_status.as_deref(), Some("scheduled"));
        assert!(updated.is_assigned_to(agent.id));
        assert_eq!(updated.assignment_history.len(), 1);

        assert!(engine
            .update_lead_status(lead.id, "site_visit", Some("hot".to_string()))
            .await
            .is_err());
        assert!(engine
            .update_lead_status(uuid::Uuid::now_v7(), "new", None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_delete_lead_refreshes_holder_count() {
        let (store, engine) = engine();
        let agent = Agent::new("Priya", "priya@example.com");
        store.agent_insert(&agent).await.unwrap();
        let lead = engine.create_lead(intake("9876543210")).await.unwrap();
        engine.assign_specific(&[lead.id], agent.id, None).await.unwrap();

        engine.delete_lead(lead.id).await.unwrap();
        assert_eq!(
            store.agent_get(agent.id).await.unwrap().unwrap().assigned_lead_count,
            0
        );
        assert!(engine.get_lead(lead.id).await.is_err());
    }
}
