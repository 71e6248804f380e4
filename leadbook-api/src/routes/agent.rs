//! Agent REST API Routes
//!
//! Registration, listing and removal of the agents leads are assigned to.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use leadbook_core::{Agent, AgentId};
use leadbook_engine::LeadEngine;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    types::{required, DeletedResponse, ListAgentsResponse, RegisterAgentRequest},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/agents - Register a new agent
#[utoipa::path(
    post,
    path = "/api/v1/agents",
    tag = "Agents",
    request_body = RegisterAgentRequest,
    responses(
        (status = 201, description = "Agent registered successfully", body = Agent),
        (status = 400, description = "Invalid request", body = ApiError),
    ),
)]
pub async fn register_agent(
    State(engine): State<LeadEngine>,
    payload: Result<Json<RegisterAgentRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let name = required(req.name, "name")?;
    let email = required(req.email, "email")?;

    let agent = engine.register_agent(name, email, req.phone, req.role).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

/// GET /api/v1/agents - List agents with live lead counts
#[utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "Agents",
    responses(
        (status = 200, description = "List of agents", body = ListAgentsResponse),
    ),
)]
pub async fn list_agents(State(engine): State<LeadEngine>) -> ApiResult<Json<ListAgentsResponse>> {
    let agents = engine.list_agents().await?;
    let total = agents.len();
    Ok(Json(ListAgentsResponse { agents, total }))
}

/// GET /api/v1/agents/{id} - Get agent by ID
#[utoipa::path(
    get,
    path = "/api/v1/agents/{id}",
    tag = "Agents",
    params(
        ("id" = uuid::Uuid, Path, description = "Agent ID")
    ),
    responses(
        (status = 200, description = "Agent details", body = Agent),
        (status = 404, description = "Agent not found", body = ApiError),
    ),
)]
pub async fn get_agent(
    State(engine): State<LeadEngine>,
    Path(id): Path<AgentId>,
) -> ApiResult<Json<Agent>> {
    Ok(Json(engine.get_agent(id).await?))
}

/// DELETE /api/v1/agents/{id} - Remove an agent that holds no leads
#[utoipa::path(
    delete,
    path = "/api/v1/agents/{id}",
    tag = "Agents",
    params(
        ("id" = uuid::Uuid, Path, description = "Agent ID")
    ),
    responses(
        (status = 200, description = "Agent removed", body = DeletedResponse),
        (status = 404, description = "Agent not found", body = ApiError),
        (status = 409, description = "Agent still holds leads", body = ApiError),
    ),
)]
pub async fn delete_agent(
    State(engine): State<LeadEngine>,
    Path(id): Path<AgentId>,
) -> ApiResult<Json<DeletedResponse>> {
    engine.delete_agent(id).await?;
    Ok(Json(DeletedResponse {
        id,
        message: format!("Agent {} deleted", id),
    }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_agents).post(register_agent))
        .route("/:id", get(get_agent).delete(delete_agent))
}
