//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use leadbook_core::AssignmentConfig;
use leadbook_engine::LeadEngine;
use leadbook_storage::LeadbookStore;

/// Application-wide state shared across all routes.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Engine over the configured store. Cloning shares the store handle.
    pub engine: LeadEngine,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn LeadbookStore>, config: AssignmentConfig) -> Self {
        Self {
            engine: LeadEngine::new(store, config),
            start_time: Instant::now(),
        }
    }
}

/// Implement `FromRef<AppState>` so handlers can extract a single field.
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<AppState> for $type {
            fn from_ref(state: &AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}

impl_from_ref!(LeadEngine, engine);
impl_from_ref!(Instant, start_time);
