//! Assignment REST API Routes
//!
//! Specific and random assignment plus bulk unassignment. Each handler
//! validates the request shape, delegates to [`LeadEngine`] and records
//! the resulting lead movement in Prometheus.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use leadbook_engine::{AssignRandomOutcome, AssignSpecificOutcome, LeadEngine, UnassignOutcome};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    telemetry::metrics,
    types::{required, AssignRandomRequest, AssignSpecificRequest, UnassignAllRequest},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/assignments/specific - Assign chosen leads to an agent
#[utoipa::path(
    post,
    path = "/api/v1/assignments/specific",
    tag = "Assignments",
    request_body = AssignSpecificRequest,
    responses(
        (status = 200, description = "Leads assigned; previously seen leads skipped", body = AssignSpecificOutcome),
        (status = 400, description = "Invalid request, or every lead was already seen by the agent", body = ApiError),
        (status = 404, description = "Agent not found", body = ApiError),
    ),
)]
pub async fn assign_specific(
    State(engine): State<LeadEngine>,
    payload: Result<Json<AssignSpecificRequest>, JsonRejection>,
) -> ApiResult<Json<AssignSpecificOutcome>> {
    let Json(req) = payload?;
    let lead_ids = required(req.lead_ids, "leadIds")?;
    let agent_id = required(req.agent_id, "agentId")?;

    let outcome = engine
        .assign_specific(&lead_ids, agent_id, req.assigned_by)
        .await?;

    if let Some(metrics) = metrics() {
        metrics.record_assigned("specific", outcome.assigned_count);
    }
    Ok(Json(outcome))
}

/// POST /api/v1/assignments/random - Draw unseen leads from the pool
#[utoipa::path(
    post,
    path = "/api/v1/assignments/random",
    tag = "Assignments",
    request_body = AssignRandomRequest,
    responses(
        (status = 200, description = "Leads assigned, possibly fewer than requested", body = AssignRandomOutcome),
        (status = 400, description = "Invalid request, or no unseen leads available", body = ApiError),
        (status = 404, description = "Agent not found", body = ApiError),
    ),
)]
pub async fn assign_random(
    State(engine): State<LeadEngine>,
    payload: Result<Json<AssignRandomRequest>, JsonRejection>,
) -> ApiResult<Json<AssignRandomOutcome>> {
    let Json(req) = payload?;
    let count = required(req.count, "count")?;
    let agent_id = required(req.agent_id, "agentId")?;

    let outcome = engine
        .assign_random(
            count,
            agent_id,
            req.assigned_by,
            req.status.as_deref(),
            req.location.as_deref(),
        )
        .await?;

    if let Some(metrics) = metrics() {
        metrics.record_assigned("random", outcome.assigned_count);
    }
    Ok(Json(outcome))
}

/// POST /api/v1/assignments/unassign-all - Release every lead an agent holds
#[utoipa::path(
    post,
    path = "/api/v1/assignments/unassign-all",
    tag = "Assignments",
    request_body = UnassignAllRequest,
    responses(
        (status = 200, description = "Leads released", body = UnassignOutcome),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Agent not found or holds no leads", body = ApiError),
    ),
)]
pub async fn unassign_all(
    State(engine): State<LeadEngine>,
    payload: Result<Json<UnassignAllRequest>, JsonRejection>,
) -> ApiResult<Json<UnassignOutcome>> {
    let Json(req) = payload?;
    let agent_id = required(req.agent_id, "agentId")?;

    let outcome = engine.unassign_all(agent_id).await?;

    if let Some(metrics) = metrics() {
        metrics.record_unassigned("unassign-all", outcome.unassigned_count);
    }
    Ok(Json(outcome))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/specific", post(assign_specific))
        .route("/random", post(assign_random))
        .route("/unassign-all", post(unassign_all))
}
