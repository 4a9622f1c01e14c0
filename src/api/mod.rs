//! HTTP API module
//! 
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/focus", get(view_handler))
        .route("/focus/state", get(snapshot_handler))
        .route("/focus/start", post(start_handler))
        .route("/focus/pause", post(pause_handler))
        .route("/focus/toggle", post(toggle_handler))
        .route("/focus/reset", post(reset_handler))
        .route("/focus/skip", post(skip_handler))
        .route("/focus/preset", put(preset_handler))
        .route("/focus/auto-start", put(auto_start_handler))
        .route("/focus/phase", put(phase_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
