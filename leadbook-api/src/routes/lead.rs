//! Lead REST API Routes
//!
//! Intake, lookup, status changes and deletion. Assignment state is only
//! changed through the assignment routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use leadbook_core::{Lead, LeadId};
use leadbook_engine::{LeadEngine, NewLead};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    types::{required, DeletedResponse, UpdateLeadStatusRequest},
};

/// POST /api/v1/leads - Create a lead
#[utoipa::path(
    post,
    path = "/api/v1/leads",
    tag = "Leads",
    request_body = NewLead,
    responses(
        (status = 201, description = "Lead created", body = Lead),
        (status = 400, description = "Invalid phone, status or substatus", body = ApiError),
    ),
)]
pub async fn create_lead(
    State(engine): State<LeadEngine>,
    payload: Result<Json<NewLead>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(new) = payload?;
    let lead = engine.create_lead(new).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /api/v1/leads/{id} - Get lead by ID
#[utoipa::path(
    get,
    path = "/api/v1/leads/{id}",
    tag = "Leads",
    params(
        ("id" = uuid::Uuid, Path, description = "Lead ID")
    ),
    responses(
        (status = 200, description = "Lead with assignment history", body = Lead),
        (status = 404, description = "Lead not found", body = ApiError),
    ),
)]
pub async fn get_lead(
    State(engine): State<LeadEngine>,
    Path(id): Path<LeadId>,
) -> ApiResult<Json<Lead>> {
    Ok(Json(engine.get_lead(id).await?))
}

/// PATCH /api/v1/leads/{id}/status - Change status and substatus
#[utoipa::path(
    patch,
    path = "/api/v1/leads/{id}/status",
    tag = "Leads",
    params(
        ("id" = uuid::Uuid, Path, description = "Lead ID")
    ),
    request_body = UpdateLeadStatusRequest,
    responses(
        (status = 200, description = "Updated lead", body = Lead),
        (status = 400, description = "Unknown status or substatus", body = ApiError),
        (status = 404, description = "Lead not found", body = ApiError),
    ),
)]
pub async fn update_lead_status(
    State(engine): State<LeadEngine>,
    Path(id): Path<LeadId>,
    payload: Result<Json<UpdateLeadStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Lead>> {
    let Json(req) = payload?;
    let status = required(req.status, "status")?;
    let lead = engine.update_lead_status(id, &status, req.sub_status).await?;
    Ok(Json(lead))
}

/// DELETE /api/v1/leads/{id} - Delete a lead
#[utoipa::path(
    delete,
    path = "/api/v1/leads/{id}",
    tag = "Leads",
    params(
        ("id" = uuid::Uuid, Path, description = "Lead ID")
    ),
    responses(
        (status = 200, description = "Lead deleted", body = DeletedResponse),
        (status = 404, description = "Lead not found", body = ApiError),
    ),
)]
pub async fn delete_lead(
    State(engine): State<LeadEngine>,
    Path(id): Path<LeadId>,
) -> ApiResult<Json<DeletedResponse>> {
    engine.delete_lead(id).await?;
    Ok(Json(DeletedResponse {
        id,
        message: format!("Lead {} deleted", id),
    }))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_lead))
        .route("/:id", get(get_lead).delete(delete_lead))
        .route("/:id/status", patch(update_lead_status))
}
