//! Result types returned by engine operations.
//!
//! All of these serialize with camelCase field names and carry a
//! human-readable `message`.

use leadbook_core::{AgentId, Inconsistency, Lead, LeadId, Timestamp};
use leadbook_storage::WriteFailure;
use serde::{Deserialize, Serialize};

use crate::FixType;

// ============================================================================
// ASSIGNMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AssignSpecificOutcome {
    pub assigned_count: usize,
    /// Distinct lead ids in the request.
    pub requested_count: usize,
    /// Leads skipped because the agent has already held them.
    pub skipped_count: usize,
    /// Requested ids with no lead document.
    pub not_found_count: usize,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    pub agent_name: String,
    /// Agent's live assigned count after the write.
    pub agent_assigned_total: u64,
    #[serde(default)]
    pub errors: Vec<WriteFailure>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AssignRandomOutcome {
    pub assigned_count: usize,
    pub requested_count: usize,
    /// Candidates that matched the filter before sampling.
    pub available_count: usize,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    pub agent_name: String,
    pub agent_assigned_total: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UnassignOutcome {
    pub unassigned_count: usize,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    pub agent_name: String,
    /// Leads cleared without an open history entry for the agent.
    pub history_gaps: usize,
    #[serde(default)]
    pub errors: Vec<WriteFailure>,
    pub message: String,
}

// ============================================================================
// AUDIT
// ============================================================================

/// Compact lead reference used in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LeadRef {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub lead_id: LeadId,
    pub name: String,
    pub phone: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub assigned_at: Option<Timestamp>,
}

impl From<&Lead> for LeadRef {
    fn from(lead: &Lead) -> Self {
        Self {
            lead_id: lead.id,
            name: lead.name.clone(),
            phone: lead.phone.clone(),
            assigned_at: lead.assigned_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PhoneDuplicateGroup {
    pub phone: String,
    pub count: usize,
    pub leads: Vec<LeadRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RepeatedHistory {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub lead_id: LeadId,
    pub name: String,
    pub phone: String,
    /// Number of history entries for the agent.
    pub history_count: usize,
}

/// Issues found for one agent: duplicates among its held leads and any
/// lead whose history lists it more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AgentDuplicateReport {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    pub agent_name: String,
    pub assigned_lead_count: usize,
    pub phone_duplicates: Vec<PhoneDuplicateGroup>,
    pub repeated_history: Vec<RepeatedHistory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct InconsistentLead {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub lead_id: LeadId,
    pub name: String,
    pub phone: String,
    pub is_assigned: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assigned_to: Option<AgentId>,
    pub kind: Inconsistency,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DetectSummary {
    pub agents_checked: usize,
    pub agents_with_issues: usize,
    /// Surplus leads across phone-duplicate groups (group size minus one).
    pub total_duplicates_found: usize,
    pub repeated_history_found: usize,
    pub inconsistent_leads_found: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DetectReport {
    pub summary: DetectSummary,
    pub duplicate_report: Vec<AgentDuplicateReport>,
    pub inconsistent_leads: Vec<InconsistentLead>,
    pub message: String,
}

/// A lead released by a repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UnassignedLead {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub lead_id: LeadId,
    pub name: String,
    pub phone: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    pub agent_name: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub kept_lead_id: LeadId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RepairOutcome {
    pub fix_type: FixType,
    pub phone_duplicates_fixed: usize,
    pub inconsistent_data_fixed: usize,
    pub leads_unassigned: Vec<UnassignedLead>,
    #[serde(default)]
    pub errors: Vec<WriteFailure>,
    pub message: String,
}
