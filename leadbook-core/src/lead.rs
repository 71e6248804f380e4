//! Lead records and their assignment history.
//!
//! The lead is the sole owner of assignment truth: `assigned_to` /
//! `is_assigned` describe the current holder and `assignment_history` records
//! every agent that has ever held the lead.

use crate::{new_entity_id, AgentId, LeadId, LeadStatus, Timestamp, ValidationError};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

/// Number of digits a lead phone number must have at intake.
pub const PHONE_DIGITS: usize = 10;

// ============================================================================
// ASSIGNMENT HISTORY
// ============================================================================

/// One entry in a lead's append-only assignment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AssignmentHistoryEntry {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    /// Agent name captured when the assignment was made. Not refreshed on rename.
    #[serde(default)]
    pub agent_name: String,
    /// Legacy entries without a time decode as the Unix epoch.
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    #[serde(default)]
    pub assigned_at: Timestamp,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub unassigned_at: Option<Timestamp>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assigned_by: Option<AgentId>,
}

impl AssignmentHistoryEntry {
    /// Create an open entry (no `unassigned_at`).
    pub fn open(
        agent_id: AgentId,
        agent_name: impl Into<String>,
        assigned_by: Option<AgentId>,
        assigned_at: Timestamp,
    ) -> Self {
        Self {
            agent_id,
            agent_name: agent_name.into(),
            assigned_at,
            unassigned_at: None,
            assigned_by,
        }
    }

    /// An open entry denotes a currently active assignment.
    pub fn is_open(&self) -> bool {
        self.unassigned_at.is_none()
    }
}

/// Decode history entry by entry.
///
/// Entries that still fail to decode (no agent id, wrong shapes) are dropped
/// so one bad entry never makes the whole lead unreadable. A non-array value
/// decodes as an empty history.
fn lenient_history<'de, D>(deserializer: D) -> Result<Vec<AssignmentHistoryEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let serde_json::Value::Array(items) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

// ============================================================================
// FLAG / REFERENCE CONSISTENCY
// ============================================================================

/// Ways the `is_assigned` flag can disagree with `assigned_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum Inconsistency {
    /// `is_assigned == true` but `assigned_to` is missing.
    AssignedWithoutAgent,
    /// `is_assigned == false` but `assigned_to` still references an agent.
    AgentWithoutFlag,
}

impl Inconsistency {
    /// Human-readable reason used in audit reports.
    pub fn reason(&self) -> &'static str {
        match self {
            Inconsistency::AssignedWithoutAgent => "Marked as assigned but no agent",
            Inconsistency::AgentWithoutFlag => "Has agent reference but not marked as assigned",
        }
    }
}

// ============================================================================
// LEAD
// ============================================================================

/// A prospective customer contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: LeadId,
    pub name: String,
    /// Not unique across leads.
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub interested_location: Option<String>,

    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default)]
    pub sub_status: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub site_visit_at: Option<Timestamp>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub follow_up_at: Option<Timestamp>,
    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assigned_to: Option<AgentId>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assigned_by: Option<AgentId>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub assigned_at: Option<Timestamp>,
    #[serde(default)]
    pub is_assigned: bool,
    #[serde(default, deserialize_with = "lenient_history")]
    pub assignment_history: Vec<AssignmentHistoryEntry>,

    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Lead {
    /// Create a new, unassigned lead.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_entity_id(),
            name: name.into(),
            phone: phone.into(),
            email: None,
            interested_location: None,
            status: LeadStatus::New,
            sub_status: None,
            site_visit_at: None,
            follow_up_at: None,
            notes: None,
            assigned_to: None,
            assigned_by: None,
            assigned_at: None,
            is_assigned: false,
            assignment_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the interested location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.interested_location = Some(location.into());
        self
    }

    /// Set status and substatus.
    pub fn with_status(mut self, status: LeadStatus, sub_status: Option<String>) -> Self {
        self.status = status;
        self.sub_status = sub_status;
        self
    }

    /// Has this lead ever been given to `agent_id` (open or closed entry)?
    pub fn has_seen_agent(&self, agent_id: AgentId) -> bool {
        self.assignment_history.iter().any(|e| e.agent_id == agent_id)
    }

    /// Number of history entries for `agent_id`.
    pub fn history_count_for(&self, agent_id: AgentId) -> usize {
        self.assignment_history
            .iter()
            .filter(|e| e.agent_id == agent_id)
            .count()
    }

    /// Position of the most recent open history entry for `agent_id`.
    pub fn open_entry_index(&self, agent_id: AgentId) -> Option<usize> {
        self.assignment_history
            .iter()
            .rposition(|e| e.agent_id == agent_id && e.is_open())
    }

    /// Is the lead currently assigned to `agent_id` (flag and reference)?
    pub fn is_assigned_to(&self, agent_id: AgentId) -> bool {
        self.is_assigned && self.assigned_to == Some(agent_id)
    }

    /// Is the lead free for assignment (flag clear and no reference)?
    pub fn is_unassigned(&self) -> bool {
        !self.is_assigned && self.assigned_to.is_none()
    }

    /// Flag/reference mismatch, if any.
    pub fn inconsistency(&self) -> Option<Inconsistency> {
        match (self.is_assigned, self.assigned_to) {
            (true, None) => Some(Inconsistency::AssignedWithoutAgent),
            (false, Some(_)) => Some(Inconsistency::AgentWithoutFlag),
            _ => None,
        }
    }

    /// Validate intake fields (name, phone, status/substatus).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string(),
            });
        }
        validate_phone(&self.phone)?;
        self.status.validate_substatus(self.sub_status.as_deref())
    }
}

/// A lead phone must be exactly [`PHONE_DIGITS`] ASCII digits.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.len() == PHONE_DIGITS && phone.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            "phone",
            format!("must be exactly {} digits", PHONE_DIGITS),
        ))
    }
}
