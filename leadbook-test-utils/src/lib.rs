//! Leadbook Test Utilities
//!
//! Shared test infrastructure for the Leadbook workspace:
//! - Proptest generators for leads, agents and operation sequences
//! - Fixtures and seeded stores for common scenarios
//! - Assertions for the assignment invariants

// Re-export the in-memory store from its source crate
pub use leadbook_storage::InMemoryStore;

// Re-export core types for convenience
pub use leadbook_core::{
    Agent, AgentId, AgentRole, AssignmentError, AssignmentHistoryEntry, EntityType, Lead, LeadId,
    LeadStatus, LeadbookError, LeadbookResult, StorageError, Timestamp, ValidationError,
};

use chrono::Utc;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Leadbook entity types.

    use super::*;
    use proptest::prelude::*;

    /// A ten-digit phone drawn from a small pool so duplicates are common.
    pub fn arb_phone() -> impl Strategy<Value = String> {
        (0u32..12).prop_map(|n| format!("90000000{:02}", n))
    }

    /// Any valid ten-digit phone.
    pub fn arb_any_phone() -> impl Strategy<Value = String> {
        "[6-9][0-9]{9}"
    }

    pub fn arb_lead_status() -> impl Strategy<Value = LeadStatus> {
        prop::sample::select(LeadStatus::ALL.to_vec())
    }

    pub fn arb_location() -> impl Strategy<Value = Option<String>> {
        prop::option::of(prop::sample::select(vec![
            "Baner, Pune".to_string(),
            "Whitefield, Bangalore".to_string(),
            "Andheri, Mumbai".to_string(),
        ]))
    }

    /// Generate a Timestamp within 2020-2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    /// An unassigned lead with a valid status/substatus pair.
    pub fn arb_lead() -> impl Strategy<Value = Lead> {
        (arb_phone(), arb_lead_status(), arb_location(), any::<prop::sample::Index>()).prop_map(
            |(phone, status, location, sub)| {
                let allowed = status.allowed_substatuses();
                let sub_status = (!allowed.is_empty())
                    .then(|| allowed[sub.index(allowed.len())].to_string());
                let mut lead = Lead::new("Generated Lead", phone).with_status(status, sub_status);
                lead.interested_location = location;
                lead
            },
        )
    }

    /// An assignable agent.
    pub fn arb_agent() -> impl Strategy<Value = Agent> {
        "[A-Z][a-z]{2,8}".prop_map(|name| {
            let email = format!("{}@example.com", name.to_lowercase());
            Agent::new(name, email)
        })
    }

    /// One step in a random assignment workload. Indices are taken modulo
    /// the number of seeded agents/leads.
    #[derive(Debug, Clone)]
    pub enum Op {
        AssignSpecific { agent: usize, leads: Vec<usize> },
        AssignRandom { agent: usize, count: i64 },
        UnassignAll { agent: usize },
        Repair { scoped: Option<usize> },
    }

    pub fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0usize..4, prop::collection::vec(0usize..64, 1..8))
                .prop_map(|(agent, leads)| Op::AssignSpecific { agent, leads }),
            4 => (0usize..4, 1i64..12).prop_map(|(agent, count)| Op::AssignRandom { agent, count }),
            2 => (0usize..4).prop_map(|agent| Op::UnassignAll { agent }),
            1 => prop::option::of(0usize..4).prop_map(|scoped| Op::Repair { scoped }),
        ]
    }

    pub fn arb_ops(max: usize) -> impl Strategy<Value = Vec<Op>> {
        prop::collection::vec(arb_op(), 1..max)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common testing scenarios.

    use super::*;
    use leadbook_storage::{AgentDirectory, LeadStore};

    pub fn agent(name: &str) -> Agent {
        Agent::new(name, format!("{}@example.com", name.to_lowercase()))
    }

    pub fn admin(name: &str) -> Agent {
        agent(name).with_role(AgentRole::Admin)
    }

    /// A fresh lead with no history.
    pub fn lead(phone: &str) -> Lead {
        Lead::new("Test Lead", phone)
    }

    /// A lead currently held by `agent`, with a matching open history entry.
    pub fn held_lead(agent: &Agent, phone: &str, assigned_at: Timestamp) -> Lead {
        let mut lead = lead(phone);
        lead.is_assigned = true;
        lead.assigned_to = Some(agent.id);
        lead.assigned_at = Some(assigned_at);
        lead.assignment_history.push(AssignmentHistoryEntry::open(
            agent.id,
            agent.name.clone(),
            None,
            assigned_at,
        ));
        lead
    }

    /// `isAssigned` set with no agent reference.
    pub fn flagged_without_agent(phone: &str) -> Lead {
        let mut lead = lead(phone);
        lead.is_assigned = true;
        lead
    }

    /// Agent reference without `isAssigned`.
    pub fn agent_without_flag(agent_id: AgentId, phone: &str) -> Lead {
        let mut lead = lead(phone);
        lead.assigned_to = Some(agent_id);
        lead
    }

    /// Distinct ten-digit phones.
    pub fn phones(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("98{:08}", i)).collect()
    }

    /// A store seeded with the given agents and `lead_count` fresh leads.
    pub async fn seeded_store(
        agents: &[Agent],
        lead_count: usize,
    ) -> LeadbookResult<(InMemoryStore, Vec<Lead>)> {
        let store = InMemoryStore::new();
        for agent in agents {
            store.agent_insert(agent).await?;
        }
        let mut leads = Vec::with_capacity(lead_count);
        for phone in phones(lead_count) {
            let lead = lead(&phone);
            store.lead_insert(&lead).await?;
            leads.push(lead);
        }
        Ok((store, leads))
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for Leadbook results and invariants.

    use super::*;

    /// Assert that a LeadbookResult is a Validation error.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &LeadbookResult<T>) {
        match result {
            Err(LeadbookError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    /// Assert that a LeadbookResult is a NotFound storage error.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &LeadbookResult<T>, entity_type: EntityType) {
        match result {
            Err(LeadbookError::Storage(StorageError::NotFound { entity_type: et, .. })) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", entity_type, other),
        }
    }

    /// Assert that a LeadbookResult is an Assignment error.
    #[track_caller]
    pub fn assert_assignment_error<T: std::fmt::Debug>(result: &LeadbookResult<T>) {
        match result {
            Err(LeadbookError::Assignment(_)) => {}
            other => panic!("Expected Assignment error, got: {:?}", other),
        }
    }

    /// `is_assigned` agrees with `assigned_to`.
    #[track_caller]
    pub fn assert_flag_consistent(lead: &Lead) {
        assert!(
            lead.inconsistency().is_none(),
            "Lead {} has isAssigned={} but assignedTo={:?}",
            lead.id,
            lead.is_assigned,
            lead.assigned_to
        );
    }

    /// No agent appears more than once in the history.
    #[track_caller]
    pub fn assert_no_repeat_assignment(lead: &Lead) {
        for entry in &lead.assignment_history {
            assert_eq!(
                lead.history_count_for(entry.agent_id),
                1,
                "Lead {} was given to agent {} more than once",
                lead.id,
                entry.agent_id
            );
        }
    }

    /// At most one open entry overall, and it belongs to the current holder.
    #[track_caller]
    pub fn assert_open_entry_matches_holder(lead: &Lead) {
        let open: Vec<_> = lead
            .assignment_history
            .iter()
            .filter(|e| e.is_open())
            .collect();
        match lead.assigned_to.filter(|_| lead.is_assigned) {
            Some(holder) => {
                assert_eq!(open.len(), 1, "Lead {} held but has {} open entries", lead.id, open.len());
                assert_eq!(open[0].agent_id, holder, "Open entry is not the holder's");
            }
            None => assert!(open.is_empty(), "Free lead {} has open history entries", lead.id),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
