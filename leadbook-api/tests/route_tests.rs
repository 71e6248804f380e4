//! HTTP route tests driven through the full router with `oneshot`.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use leadbook_api::{create_api_router, ApiConfig, AppState};
use leadbook_core::AssignmentConfig;
use leadbook_storage::{AgentDirectory, InMemoryStore, LeadStore};
use leadbook_test_utils::{fixtures, Agent, Lead};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

async fn app_with(agents: &[Agent], leads: usize) -> (Router, InMemoryStore, Vec<Lead>) {
    let (store, leads) = fixtures::seeded_store(agents, leads).await.unwrap();
    let state = AppState::new(Arc::new(store.clone()), AssignmentConfig::default());
    (create_api_router(state, &ApiConfig::default()), store, leads)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

// ============================================================================
// ASSIGNMENT
// ============================================================================

#[tokio::test]
async fn test_assign_specific_then_repeat_is_rejected() {
    let agent = fixtures::agent("Priya");
    let (app, store, leads) = app_with(&[agent.clone()], 3).await;
    let ids: Vec<_> = leads.iter().map(|l| l.id).collect();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assignments/specific",
        Some(json!({ "leadIds": ids, "agentId": agent.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignedCount"], 3);
    assert_eq!(body["agentAssignedTotal"], 3);
    assert_eq!(body["message"], "Successfully assigned 3 leads to Priya");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assignments/specific",
        Some(json!({ "leadIds": [ids[0]], "agentId": agent.id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NO_QUALIFYING_LEADS");

    let held = store.lead_get(ids[0]).await.unwrap().unwrap();
    assert_eq!(held.assignment_history.len(), 1);
}

#[tokio::test]
async fn test_assign_specific_validation() {
    let agent = fixtures::agent("Priya");
    let (app, _store, _leads) = app_with(&[agent.clone()], 1).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assignments/specific",
        Some(json!({ "leadIds": [], "agentId": agent.id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assignments/specific",
        Some(json!({ "leadIds": [uuid::Uuid::now_v7()] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "agentId");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assignments/specific",
        Some(json!({ "leadIds": "not-a-list", "agentId": agent.id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_FORMAT");
}

#[tokio::test]
async fn test_assign_random_partial_availability() {
    let agent = fixtures::agent("Xavier");
    let (app, _store, _leads) = app_with(&[agent.clone()], 37).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assignments/random",
        Some(json!({ "count": 100, "agentId": agent.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignedCount"], 37);
    assert_eq!(body["availableCount"], 37);
    assert_eq!(body["requestedCount"], 100);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assignments/random",
        Some(json!({ "count": 1, "agentId": agent.id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NO_CANDIDATES");
}

#[tokio::test]
async fn test_assign_random_rejects_bad_count_and_unknown_agent() {
    let agent = fixtures::agent("Xavier");
    let (app, _store, _leads) = app_with(&[agent.clone()], 5).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assignments/random",
        Some(json!({ "count": 0, "agentId": agent.id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assignments/random",
        Some(json!({ "count": 2, "agentId": uuid::Uuid::now_v7() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "AGENT_NOT_FOUND");
}

#[tokio::test]
async fn test_unassign_all_round_trip() {
    let agent = fixtures::agent("Asha");
    let (app, store, _leads) = app_with(&[agent.clone()], 4).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assignments/unassign-all",
        Some(json!({ "agentId": agent.id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOTHING_TO_UNASSIGN");

    send(
        &app,
        Method::POST,
        "/api/v1/assignments/random",
        Some(json!({ "count": 4, "agentId": agent.id })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assignments/unassign-all",
        Some(json!({ "agentId": agent.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unassignedCount"], 4);
    assert_eq!(body["message"], "Successfully unassigned 4 leads from Asha");
    assert_eq!(
        store.agent_get(agent.id).await.unwrap().unwrap().assigned_lead_count,
        0
    );
}

// ============================================================================
// AUDIT
// ============================================================================

#[tokio::test]
async fn test_detect_and_repair_over_http() {
    let agent = fixtures::agent("Bala");
    let (app, store, _leads) = app_with(&[agent.clone()], 0).await;
    let now = chrono::Utc::now();
    store
        .lead_insert(&fixtures::held_lead(&agent, "9000000000", now - chrono::Duration::hours(1)))
        .await
        .unwrap();
    store
        .lead_insert(&fixtures::held_lead(&agent, "9000000000", now))
        .await
        .unwrap();
    store
        .lead_insert(&fixtures::flagged_without_agent("9123456789"))
        .await
        .unwrap();

    let (status, report) = send(&app, Method::GET, "/api/v1/audit/duplicates", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["summary"]["totalDuplicatesFound"], 1);
    assert_eq!(report["summary"]["inconsistentLeadsFound"], 1);
    assert_eq!(report["inconsistentLeads"][0]["reason"], "Marked as assigned but no agent");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/audit/repair",
        Some(json!({ "fixType": "all" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phoneDuplicatesFixed"], 1);
    assert_eq!(body["inconsistentDataFixed"], 1);
    assert_eq!(body["leadsUnassigned"].as_array().map(Vec::len), Some(1));

    let (_, after) = send(&app, Method::GET, "/api/v1/audit/duplicates", None).await;
    assert_eq!(after["summary"]["totalDuplicatesFound"], 0);
    assert_eq!(after["summary"]["inconsistentLeadsFound"], 0);
}

#[tokio::test]
async fn test_repair_requires_known_fix_type() {
    let (app, _store, _leads) = app_with(&[], 0).await;

    let (status, body) = send(&app, Method::POST, "/api/v1/audit/repair", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/audit/repair",
        Some(json!({ "fixType": "everything" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "fixType");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/audit/repair",
        Some(json!({ "fixType": "phone-duplicates", "agentId": uuid::Uuid::now_v7() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// AGENTS & LEADS
// ============================================================================

#[tokio::test]
async fn test_agent_lifecycle() {
    let (app, _store, _leads) = app_with(&[], 1).await;

    let (status, agent) = send(
        &app,
        Method::POST,
        "/api/v1/agents",
        Some(json!({ "name": "Meera", "email": "meera@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let agent_id = agent["id"].as_str().unwrap().to_string();

    let (status, list) = send(&app, Method::GET, "/api/v1/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);

    send(
        &app,
        Method::POST,
        "/api/v1/assignments/random",
        Some(json!({ "count": 1, "agentId": agent_id })),
    )
    .await;

    let uri = format!("/api/v1/agents/{}", agent_id);
    let (status, fetched) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["assignedLeadCount"], 1);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "AGENT_HAS_ASSIGNMENTS");

    send(
        &app,
        Method::POST,
        "/api/v1/assignments/unassign-all",
        Some(json!({ "agentId": agent_id })),
    )
    .await;
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lead_lifecycle() {
    let (app, _store, _leads) = app_with(&[], 0).await;

    let (status, lead) = send(
        &app,
        Method::POST,
        "/api/v1/leads",
        Some(json!({
            "name": "Rohan",
            "phone": "9876543210",
            "interestedLocation": "Baner, Pune"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(lead["status"], "new");
    assert_eq!(lead["isAssigned"], false);
    let uri = format!("/api/v1/leads/{}", lead["id"].as_str().unwrap());

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("{}/status", uri),
        Some(json!({ "status": "site-visit", "subStatus": "scheduled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["subStatus"], "scheduled");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/leads",
        Some(json!({ "name": "Rohan", "phone": "12345" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "LEAD_NOT_FOUND");
}

// ============================================================================
// HEALTH, METRICS, OPENAPI
// ============================================================================

#[tokio::test]
async fn test_health_metrics_and_openapi() {
    let (app, _store, _leads) = app_with(&[], 0).await;

    let (status, body) = send(&app, Method::GET, "/health/ping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("pong".to_string()));

    let (status, body) = send(&app, Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap_or_default().contains("leadbook_http_requests_total"));

    let (status, body) = send(&app, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Leadbook API");
}
