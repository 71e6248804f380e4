//! OpenAPI Specification for the Leadbook API
//!
//! Generated by utoipa from the handler annotations and the `ToSchema`
//! derives on core, storage and engine types.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::{agent, assignment, audit, health, lead};
use crate::telemetry::metrics;
use crate::types::*;

use leadbook_core::{Agent, AgentRole, AssignmentHistoryEntry, Inconsistency, Lead, LeadStatus};
use leadbook_engine::{
    AgentDuplicateReport, AssignRandomOutcome, AssignSpecificOutcome, DetectReport, DetectSummary,
    FixType, InconsistentLead, LeadRef, NewLead, PhoneDuplicateGroup, RepairOutcome,
    RepeatedHistory, UnassignOutcome, UnassignedLead,
};
use leadbook_storage::WriteFailure;

/// OpenAPI document for the Leadbook API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leadbook API",
        description = "Lead assignment, deduplication and consistency repair for a real-estate CRM",
        license(name = "MIT"),
    ),
    tags(
        (name = "Assignments", description = "Specific, random and bulk unassignment"),
        (name = "Audit", description = "Duplicate detection and repair"),
        (name = "Agents", description = "Agent directory"),
        (name = "Leads", description = "Lead intake and maintenance"),
        (name = "Health", description = "Liveness and readiness"),
        (name = "Observability", description = "Prometheus metrics"),
    ),
    paths(
        assignment::assign_specific,
        assignment::assign_random,
        assignment::unassign_all,
        audit::detect_duplicates,
        audit::repair_duplicates,
        agent::register_agent,
        agent::list_agents,
        agent::get_agent,
        agent::delete_agent,
        lead::create_lead,
        lead::get_lead,
        lead::update_lead_status,
        lead::delete_lead,
        health::ping,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        Lead,
        LeadStatus,
        AssignmentHistoryEntry,
        Inconsistency,
        Agent,
        AgentRole,
        NewLead,
        FixType,
        WriteFailure,
        AssignSpecificRequest,
        AssignRandomRequest,
        UnassignAllRequest,
        RepairRequest,
        RegisterAgentRequest,
        ListAgentsResponse,
        UpdateLeadStatusRequest,
        DeletedResponse,
        AssignSpecificOutcome,
        AssignRandomOutcome,
        UnassignOutcome,
        DetectReport,
        DetectSummary,
        AgentDuplicateReport,
        PhoneDuplicateGroup,
        RepeatedHistory,
        InconsistentLead,
        LeadRef,
        RepairOutcome,
        UnassignedLead,
        health::HealthResponse,
        health::HealthStatus,
        health::HealthDetails,
        health::ComponentHealth,
    )),
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
