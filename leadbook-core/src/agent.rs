//! CRM agents.

use crate::{new_entity_id, AgentId, Timestamp, ValidationError};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Role of a CRM user. Only `Agent` records can receive leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    #[default]
    Agent,
    Admin,
}

/// A CRM user responsible for calling and converting leads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: AgentId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: AgentRole,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Cached copy of the live count; only written from a fresh lead-store query.
    #[serde(default)]
    pub assigned_lead_count: u64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

fn default_active() -> bool {
    true
}

impl Agent {
    /// Create a new active agent.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_entity_id(),
            name: name.into(),
            email: email.into(),
            phone: None,
            role: AgentRole::Agent,
            is_active: true,
            assigned_lead_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: AgentRole) -> Self {
        self.role = role;
        self
    }

    /// Set the phone.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Can this record receive lead assignments?
    pub fn is_assignable(&self) -> bool {
        self.role == AgentRole::Agent
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string(),
            });
        }
        if !self.email.contains('@') {
            return Err(ValidationError::invalid("email", "must contain '@'"));
        }
        Ok(())
    }
}
