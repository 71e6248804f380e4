//! REST API Routes Module
//!
//! Route handlers organized by concern:
//! - Assignment and unassignment under /api/v1/assignments
//! - Duplicate detection and repair under /api/v1/audit
//! - Agent and lead maintenance under /api/v1/agents and /api/v1/leads
//! - Health checks at /health/*, metrics at /metrics, spec at /openapi.json

pub mod agent;
pub mod assignment;
pub mod audit;
pub mod health;
pub mod lead;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

/// GET /openapi.json
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Build the CORS layer from configuration.
///
/// No configured origins means any origin is allowed (development).
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if !config.is_production() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}

/// Create the complete API router.
///
/// - REST routes under /api/v1/*
/// - Health checks at /health/*
/// - Metrics at /metrics
/// - OpenAPI spec at /openapi.json
///
/// Every request passes through the observability middleware, the
/// `tower-http` trace layer and CORS.
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let api_routes = Router::new()
        .nest("/assignments", assignment::create_router())
        .nest("/audit", audit::create_router())
        .nest("/agents", agent::create_router())
        .nest("/leads", lead::create_router());

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_builds_for_both_modes() {
        let _ = build_cors_layer(&ApiConfig::default());
        let strict = ApiConfig {
            cors_origins: vec!["https://crm.example.com".to_string(), "\n".to_string()],
            ..Default::default()
        };
        assert!(strict.is_production());
        let _ = build_cors_layer(&strict);
    }
}
