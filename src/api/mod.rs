//! HTTP API module
//!
//! The command surface of the timer: every button and keyboard shortcut of a
//! client maps onto one of these endpoints.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/toggle", post(toggle_handler))
        .route("/work/start", post(start_work_handler))
        .route("/work/stop", post(stop_work_handler))
        .route("/break/start", post(start_break_handler))
        .route("/break/stop", post(stop_break_handler))
        .route("/pause", post(pause_handler))
        .route("/resume", post(resume_handler))
        .route("/reset", post(reset_handler))
        .route("/status", get(status_handler))
        .route("/stats", get(stats_handler).delete(clear_stats_handler))
        .route("/config", get(config_handler).put(update_config_handler))
        .route("/theme", get(theme_handler).put(set_theme_handler))
        .route("/theme/toggle", post(toggle_theme_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
