//! Lead update payloads and bulk-write types.

use chrono::Utc;
use leadbook_core::{
    AgentId, AssignmentHistoryEntry, EntityType, Lead, LeadId, LeadStatus, StorageError, Timestamp,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// UPDATE PAYLOAD
// ============================================================================

/// Partial update applied to a lead document.
///
/// `Option<Option<T>>` fields distinguish "leave alone" (`None`) from
/// "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadUpdate {
    pub is_assigned: Option<bool>,
    pub assigned_to: Option<Option<AgentId>>,
    pub assigned_by: Option<Option<AgentId>>,
    pub assigned_at: Option<Option<Timestamp>>,
    /// Appended after any close below.
    pub push_history: Option<AssignmentHistoryEntry>,
    /// Close the history entry at this position.
    pub close_history_entry: Option<(usize, Timestamp)>,
    pub status: Option<(LeadStatus, Option<String>)>,
}

impl LeadUpdate {
    /// Give the lead to `agent_id` and append an open history entry.
    pub fn assign(
        agent_id: AgentId,
        agent_name: impl Into<String>,
        assigned_by: Option<AgentId>,
        at: Timestamp,
    ) -> Self {
        Self {
            is_assigned: Some(true),
            assigned_to: Some(Some(agent_id)),
            assigned_by: Some(assigned_by),
            assigned_at: Some(Some(at)),
            push_history: Some(AssignmentHistoryEntry::open(
                agent_id,
                agent_name,
                assigned_by,
                at,
            )),
            ..Default::default()
        }
    }

    /// Clear all four current-assignment fields.
    pub fn clear_assignment() -> Self {
        Self {
            is_assigned: Some(false),
            assigned_to: Some(None),
            assigned_by: Some(None),
            assigned_at: Some(None),
            ..Default::default()
        }
    }

    /// Drop the agent reference without touching the flag.
    pub fn clear_references() -> Self {
        Self {
            assigned_to: Some(None),
            assigned_by: Some(None),
            assigned_at: Some(None),
            ..Default::default()
        }
    }

    /// Clear only the flag.
    pub fn mark_unassigned() -> Self {
        Self {
            is_assigned: Some(false),
            ..Default::default()
        }
    }

    /// Replace status and substatus.
    pub fn set_status(status: LeadStatus, sub_status: Option<String>) -> Self {
        Self {
            status: Some((status, sub_status)),
            ..Default::default()
        }
    }

    /// Also close the history entry at `index`.
    pub fn close_history_entry(mut self, index: usize, at: Timestamp) -> Self {
        self.close_history_entry = Some((index, at));
        self
    }

    /// Apply to a lead in place.
    ///
    /// The lead is left untouched when the history close is invalid.
    pub fn apply(&self, lead: &mut Lead) -> Result<(), StorageError> {
        if let Some((index, at)) = self.close_history_entry {
            let entry = lead.assignment_history.get_mut(index).ok_or_else(|| {
                StorageError::UpdateFailed {
                    entity_type: EntityType::Lead,
                    id: lead.id,
                    reason: format!("history position {} out of range", index),
                }
            })?;
            if !entry.is_open() {
                return Err(StorageError::UpdateFailed {
                    entity_type: EntityType::Lead,
                    id: lead.id,
                    reason: format!("history entry {} already closed", index),
                });
            }
            entry.unassigned_at = Some(at);
        }
        if let Some(flag) = self.is_assigned {
            lead.is_assigned = flag;
        }
        if let Some(agent) = self.assigned_to {
            lead.assigned_to = agent;
        }
        if let Some(by) = self.assigned_by {
            lead.assigned_by = by;
        }
        if let Some(at) = self.assigned_at {
            lead.assigned_at = at;
        }
        if let Some(entry) = &self.push_history {
            lead.assignment_history.push(entry.clone());
        }
        if let Some((status, sub_status)) = &self.status {
            lead.status = *status;
            lead.sub_status = sub_status.clone();
        }
        lead.updated_at = Utc::now();
        Ok(())
    }
}

// ============================================================================
// BULK WRITES
// ============================================================================

/// One per-document write in a bulk batch.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadWriteOp {
    pub lead_id: LeadId,
    pub update: LeadUpdate,
}

impl LeadWriteOp {
    pub fn new(lead_id: LeadId, update: LeadUpdate) -> Self {
        Self { lead_id, update }
    }
}

/// A single document that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WriteFailure {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub lead_id: LeadId,
    pub reason: String,
}

/// Outcome of a bulk write. Failures never abort sibling writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkWriteResult {
    pub matched: usize,
    pub modified: usize,
    pub failures: Vec<WriteFailure>,
}

impl BulkWriteResult {
    pub(crate) fn record_failure(&mut self, lead_id: LeadId, reason: impl Into<String>) {
        self.failures.push(WriteFailure {
            lead_id,
            reason: reason.into(),
        });
    }
}
