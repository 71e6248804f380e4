//! Lead query filters.
//!
//! A `LeadFilter` is a conjunction: every populated criterion must match.
//! Backends evaluate it with [`LeadFilter::matches`].

use leadbook_core::{AgentId, Lead, LeadId, LeadStatus};
use std::collections::HashSet;

/// Criterion on the `assigned_to` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignedToFilter {
    /// Reference is absent.
    IsNull,
    /// Reference is present (any agent).
    NotNull,
    /// Reference equals the given agent.
    Equals(AgentId),
}

/// Filter over lead documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    pub ids: Option<HashSet<LeadId>>,
    pub assigned_to: Option<AssignedToFilter>,
    pub is_assigned: Option<bool>,
    /// Exclude leads whose history contains this agent.
    pub not_seen_by: Option<AgentId>,
    pub status: Option<LeadStatus>,
    /// Case-insensitive substring of `interested_location`.
    pub location_contains: Option<String>,
}

impl LeadFilter {
    /// Match-all filter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(mut self, ids: impl IntoIterator<Item = LeadId>) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    pub fn assigned_to(mut self, criterion: AssignedToFilter) -> Self {
        self.assigned_to = Some(criterion);
        self
    }

    pub fn is_assigned(mut self, flag: bool) -> Self {
        self.is_assigned = Some(flag);
        self
    }

    /// Leads currently held by `agent_id` (flag set and reference equal).
    pub fn held_by(self, agent_id: AgentId) -> Self {
        self.is_assigned(true)
            .assigned_to(AssignedToFilter::Equals(agent_id))
    }

    /// Leads free for assignment (flag clear and no reference).
    pub fn unassigned(self) -> Self {
        self.is_assigned(false).assigned_to(AssignedToFilter::IsNull)
    }

    pub fn not_seen_by(mut self, agent_id: AgentId) -> Self {
        self.not_seen_by = Some(agent_id);
        self
    }

    pub fn status(mut self, status: LeadStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn location_contains(mut self, fragment: impl Into<String>) -> Self {
        self.location_contains = Some(fragment.into().to_lowercase());
        self
    }

    /// Evaluate the filter against a lead.
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(&lead.id) {
                return false;
            }
        }
        if let Some(criterion) = self.assigned_to {
            let ok = match criterion {
                AssignedToFilter::IsNull => lead.assigned_to.is_none(),
                AssignedToFilter::NotNull => lead.assigned_to.is_some(),
                AssignedToFilter::Equals(agent_id) => lead.assigned_to == Some(agent_id),
            };
            if !ok {
                return false;
            }
        }
        if let Some(flag) = self.is_assigned {
            if lead.is_assigned != flag {
                return false;
            }
        }
        if let Some(agent_id) = self.not_seen_by {
            if lead.has_seen_agent(agent_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if lead.status != status {
                return false;
            }
        }
        if let Some(fragment) = &self.location_contains {
            match &lead.interested_location {
                Some(location) if location.to_lowercase().contains(fragment.as_str()) => {}
                _ => return false,
            }
        }
        true
    }
}
