//! Assignment: give leads to an agent without ever repeating a pairing.
//!
//! A lead qualifies for an agent only when its history has no entry for that
//! agent, open or closed. History membership survives unassignment, so a
//! freed lead never cycles back to an agent that already held it.

use std::collections::HashSet;

use chrono::Utc;
use leadbook_core::{
    AgentId, AssignmentError, Lead, LeadId, LeadStatus, LeadbookResult, ValidationError,
};
use leadbook_storage::{LeadFilter, LeadStore, LeadUpdate, LeadWriteOp};

use crate::outcome::{AssignRandomOutcome, AssignSpecificOutcome};
use crate::{plural, LeadEngine};

impl LeadEngine {
    /// Assign the given leads to `agent_id`, skipping any the agent has held before.
    ///
    /// A lead currently held by another agent is handed over: that agent's
    /// open history entry is closed in the same document write.
    #[tracing::instrument(skip(self, lead_ids), fields(requested = lead_ids.len()))]
    pub async fn assign_specific(
        &self,
        lead_ids: &[LeadId],
        agent_id: AgentId,
        assigned_by: Option<AgentId>,
    ) -> LeadbookResult<AssignSpecificOutcome> {
        let requested = dedup_ids(lead_ids);
        if requested.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "leadIds".to_string(),
            }
            .into());
        }
        if requested.len() > self.config.max_specific_batch {
            return Err(ValidationError::ConstraintViolation {
                constraint: "max_specific_batch".to_string(),
                reason: format!(
                    "{} lead ids requested, at most {} allowed",
                    requested.len(),
                    self.config.max_specific_batch
                ),
            }
            .into());
        }

        let agent = self.resolve_agent(agent_id).await?;

        let found = self
            .store
            .lead_find(&LeadFilter::new().ids(requested.iter().copied()))
            .await?;
        if found.is_empty() {
            return Err(
                ValidationError::invalid("leadIds", "none of the requested leads exist").into(),
            );
        }
        let not_found_count = requested.len() - found.len();

        let (qualifying, seen): (Vec<Lead>, Vec<Lead>) =
            found.into_iter().partition(|l| !l.has_seen_agent(agent_id));
        let skipped_count = seen.len();

        if qualifying.is_empty() {
            return Err(AssignmentError::NoQualifyingLeads {
                agent_id,
                requested: requested.len(),
                already_seen: skipped_count,
            }
            .into());
        }

        let now = Utc::now();
        let mut previous_holders = HashSet::new();
        let ops: Vec<LeadWriteOp> = qualifying
            .iter()
            .map(|lead| {
                let mut update = LeadUpdate::assign(agent_id, agent.name.clone(), assigned_by, now);
                if let Some(holder) = lead.assigned_to.filter(|h| *h != agent_id) {
                    previous_holders.insert(holder);
                    if let Some(index) = lead.open_entry_index(holder) {
                        update = update.close_history_entry(index, now);
                    }
                }
                LeadWriteOp::new(lead.id, update)
            })
            .collect();

        let result = self.store.lead_bulk_write(ops).await?;
        for failure in &result.failures {
            tracing::warn!(lead_id = %failure.lead_id, reason = %failure.reason, "Lead assignment failed");
        }

        let agent_assigned_total = self.refresh_assigned_count(agent_id).await?;
        for holder in previous_holders {
            tracing::debug!(from = %holder, to = %agent_id, "Handed over leads");
            self.refresh_assigned_count(holder).await?;
        }

        let mut notes = Vec::new();
        if skipped_count > 0 {
            notes.push(format!(
                "{} skipped as previously assigned to this agent",
                were(skipped_count)
            ));
        }
        if not_found_count > 0 {
            notes.push(format!("{} not found", were(not_found_count)));
        }
        if !result.failures.is_empty() {
            notes.push(format!("{} failed to update", plural(result.failures.len(), "lead")));
        }
        let mut message = format!(
            "Successfully assigned {} to {}",
            plural(result.modified, "lead"),
            agent.name
        );
        if !notes.is_empty() {
            message.push_str(&format!(" ({})", notes.join("; ")));
        }

        tracing::info!(
            agent_id = %agent_id,
            assigned = result.modified,
            skipped = skipped_count,
            not_found = not_found_count,
            "Assigned specific leads"
        );

        Ok(AssignSpecificOutcome {
            assigned_count: result.modified,
            requested_count: requested.len(),
            skipped_count,
            not_found_count,
            agent_id,
            agent_name: agent.name,
            agent_assigned_total,
            errors: result.failures,
            message,
        })
    }

    /// Assign up to `count` randomly sampled free leads the agent has never held.
    ///
    /// Fewer candidates than requested is a partial success. The sampled ids
    /// are written with a plain id-filtered update, so two concurrent calls
    /// can both claim the same lead; the last write wins.
    #[tracing::instrument(skip(self))]
    pub async fn assign_random(
        &self,
        count: i64,
        agent_id: AgentId,
        assigned_by: Option<AgentId>,
        status: Option<&str>,
        location: Option<&str>,
    ) -> LeadbookResult<AssignRandomOutcome> {
        if count <= 0 {
            return Err(ValidationError::invalid("count", "must be a positive integer").into());
        }
        let requested = count as usize;
        if requested > self.config.max_random_count {
            return Err(ValidationError::invalid(
                "count",
                format!("must not exceed {}", self.config.max_random_count),
            )
            .into());
        }
        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<LeadStatus>()?),
            None => None,
        };
        let location = location.map(str::trim).filter(|s| !s.is_empty());

        let agent = self.resolve_agent(agent_id).await?;

        let mut filter = LeadFilter::new().unassigned().not_seen_by(agent_id);
        if let Some(status) = status {
            filter = filter.status(status);
        }
        if let Some(location) = location {
            filter = filter.location_contains(location);
        }

        let available_count = self.store.lead_count(&filter).await?;
        if available_count == 0 {
            return Err(AssignmentError::NoCandidates { agent_id }.into());
        }

        let sampled = self
            .store
            .lead_sample(&filter, requested.min(available_count))
            .await?;
        let assigned_count = self
            .store
            .lead_update_many(
                &LeadFilter::new().ids(sampled.iter().map(|l| l.id)),
                &LeadUpdate::assign(agent_id, agent.name.clone(), assigned_by, Utc::now()),
            )
            .await?;

        let agent_assigned_total = self.refresh_assigned_count(agent_id).await?;

        let mut message = format!(
            "Successfully assigned {} to {}",
            plural(assigned_count, "lead"),
            agent.name
        );
        if assigned_count < requested {
            message.push_str(&format!(
                " ({} requested, only {} available)",
                requested, available_count
            ));
        }

        tracing::info!(
            agent_id = %agent_id,
            assigned = assigned_count,
            requested,
            available = available_count,
            "Assigned random leads"
        );

        Ok(AssignRandomOutcome {
            assigned_count,
            requested_count: requested,
            available_count,
            agent_id,
            agent_name: agent.name,
            agent_assigned_total,
            message,
        })
    }
}

/// Distinct ids in first-seen order.
fn dedup_ids(ids: &[LeadId]) -> Vec<LeadId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// "1 lead was" / "8 leads were".
fn were(count: usize) -> String {
    if count == 1 {
        "1 lead was".to_string()
    } else {
        format!("{} leads were", count)
    }
}
