//! Request and response bodies that exist only at the HTTP edge.
//!
//! Operation results are the engine's outcome types and are serialized as-is.
//! Request fields the engine requires are still `Option` here so a missing
//! field yields a `MISSING_FIELD` error instead of a body rejection.

use leadbook_core::{Agent, AgentId, AgentRole, LeadId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};

/// Unwrap a required request field.
pub(crate) fn required<T>(value: Option<T>, field: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::missing_field(field))
}

// ============================================================================
// ASSIGNMENT
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignSpecificRequest {
    /// Leads to hand to the agent. Duplicates are ignored.
    #[serde(default)]
    #[schema(value_type = Option<Vec<String>>)]
    pub lead_ids: Option<Vec<LeadId>>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub agent_id: Option<AgentId>,
    /// Admin performing the assignment.
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub assigned_by: Option<AgentId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRandomRequest {
    /// How many leads to draw. Must be positive.
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub agent_id: Option<AgentId>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub assigned_by: Option<AgentId>,
    /// Only draw leads with this status.
    #[serde(default)]
    pub status: Option<String>,
    /// Only draw leads whose location contains this text (case-insensitive).
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnassignAllRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub agent_id: Option<AgentId>,
}

// ============================================================================
// AUDIT
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepairRequest {
    /// `phone-duplicates`, `inconsistent-data` or `all`.
    #[serde(default)]
    pub fix_type: Option<String>,
    /// Restrict the phone-duplicate pass to one agent.
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub agent_id: Option<AgentId>,
}

// ============================================================================
// AGENTS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAgentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<AgentRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListAgentsResponse {
    pub agents: Vec<Agent>,
    pub total: usize,
}

// ============================================================================
// LEADS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sub_status: Option<String>,
}

/// Body of a successful delete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: uuid::Uuid,
    pub message: String,
}
