//! Unassignment: release every lead an agent currently holds.

use chrono::Utc;
use leadbook_core::{AgentId, AssignmentError, Lead, LeadbookResult, Timestamp};
use leadbook_storage::{LeadFilter, LeadStore, LeadUpdate, LeadWriteOp};

use crate::outcome::UnassignOutcome;
use crate::{plural, LeadEngine};

/// Per-lead release write: close the agent's most recent open entry and
/// clear the current assignment.
///
/// Returns `false` in the second slot when the lead had no open entry for
/// the agent (a history gap); the fields are cleared regardless.
pub(crate) fn release_op(lead: &Lead, agent_id: AgentId, at: Timestamp) -> (LeadWriteOp, bool) {
    let update = LeadUpdate::clear_assignment();
    match lead.open_entry_index(agent_id) {
        Some(index) => (
            LeadWriteOp::new(lead.id, update.close_history_entry(index, at)),
            true,
        ),
        None => (LeadWriteOp::new(lead.id, update), false),
    }
}

impl LeadEngine {
    /// Release all leads currently held by `agent_id`.
    ///
    /// Per-document failures are collected and never stop sibling writes.
    #[tracing::instrument(skip(self))]
    pub async fn unassign_all(&self, agent_id: AgentId) -> LeadbookResult<UnassignOutcome> {
        let agent = self.resolve_agent(agent_id).await?;

        let held = self
            .store
            .lead_find(&LeadFilter::new().held_by(agent_id))
            .await?;
        if held.is_empty() {
            return Err(AssignmentError::NothingToUnassign { agent_id }.into());
        }

        let now = Utc::now();
        let mut history_gaps = 0;
        let ops: Vec<LeadWriteOp> = held
            .iter()
            .map(|lead| {
                let (op, closed) = release_op(lead, agent_id, now);
                if !closed {
                    history_gaps += 1;
                    tracing::warn!(lead_id = %lead.id, agent_id = %agent_id, "No open history entry for held lead");
                }
                op
            })
            .collect();

        let result = self.store.lead_bulk_write(ops).await?;
        for failure in &result.failures {
            tracing::warn!(lead_id = %failure.lead_id, reason = %failure.reason, "Lead unassignment failed");
        }

        self.refresh_assigned_count(agent_id).await?;

        let mut message = format!(
            "Successfully unassigned {} from {}",
            plural(result.modified, "lead"),
            agent.name
        );
        if !result.failures.is_empty() {
            message.push_str(&format!(
                " ({} failed to update)",
                plural(result.failures.len(), "lead")
            ));
        }

        tracing::info!(
            agent_id = %agent_id,
            unassigned = result.modified,
            history_gaps,
            failed = result.failures.len(),
            "Unassigned all leads"
        );

        Ok(UnassignOutcome {
            unassigned_count: result.modified,
            agent_id,
            agent_name: agent.name,
            history_gaps,
            errors: result.failures,
            message,
        })
    }
}
