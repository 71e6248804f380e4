//! Leadbook API Server Entry Point
//!
//! Bootstraps telemetry and configuration, opens the store and starts the
//! Axum HTTP server.

use leadbook_api::telemetry::{init_tracer, TelemetryConfig};
use leadbook_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env()?;
    let store = api_config.open_store()?;
    let state = AppState::new(store, api_config.assignment.clone());

    let app = create_api_router(state, &api_config);

    let addr = api_config.bind_addr()?;
    tracing::info!(
        %addr,
        store = ?api_config.store,
        max_random_count = api_config.assignment.max_random_count,
        max_specific_batch = api_config.assignment.max_specific_batch,
        "Starting Leadbook API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
