//! Leadbook API - REST Layer
//!
//! Exposes the lead assignment engine over HTTP with Axum: assignment,
//! audit, agent and lead routes, health checks, Prometheus metrics and an
//! OpenAPI document. The store backend is chosen at startup from
//! [`ApiConfig`].

pub mod config;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
