//! Consistency audit routes: duplicate detection and repair.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use leadbook_engine::{DetectReport, FixType, LeadEngine, RepairOutcome};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    telemetry::metrics,
    types::{required, RepairRequest},
};

/// GET /api/v1/audit/duplicates - Report phone duplicates and bad flags
#[utoipa::path(
    get,
    path = "/api/v1/audit/duplicates",
    tag = "Audit",
    responses(
        (status = 200, description = "Read-only consistency report", body = DetectReport),
        (status = 500, description = "Store failure", body = ApiError),
    ),
)]
pub async fn detect_duplicates(
    State(engine): State<LeadEngine>,
) -> ApiResult<Json<DetectReport>> {
    Ok(Json(engine.detect_duplicates().await?))
}

/// POST /api/v1/audit/repair - Fix detected defects
#[utoipa::path(
    post,
    path = "/api/v1/audit/repair",
    tag = "Audit",
    request_body = RepairRequest,
    responses(
        (status = 200, description = "Repair finished; per-lead failures listed in errors", body = RepairOutcome),
        (status = 400, description = "Missing or unknown fixType", body = ApiError),
        (status = 404, description = "Scoped agent not found", body = ApiError),
    ),
)]
pub async fn repair_duplicates(
    State(engine): State<LeadEngine>,
    payload: Result<Json<RepairRequest>, JsonRejection>,
) -> ApiResult<Json<RepairOutcome>> {
    let Json(req) = payload?;
    let fix_type: FixType = required(req.fix_type, "fixType")?.parse()?;

    let outcome = engine.repair_duplicates(fix_type, req.agent_id).await?;

    if let Some(metrics) = metrics() {
        metrics.record_repair("phone-duplicates", outcome.phone_duplicates_fixed);
        metrics.record_repair("inconsistent-data", outcome.inconsistent_data_fixed);
        metrics.record_unassigned("phone-duplicate", outcome.leads_unassigned.len());
    }
    Ok(Json(outcome))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/duplicates", get(detect_duplicates))
        .route("/repair", post(repair_duplicates))
}
