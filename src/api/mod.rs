//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

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
        .route("/plan", get(plan_handler))
        .route("/options", get(options_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/tasks", post(add_task_handler))
        .route("/tasks/:id", axum::routing::delete(delete_task_handler))
        .route("/tasks/:id/toggle", post(toggle_task_handler))
        // Timer endpoints
        .route(
            "/tasks/:id/timer",
            post(open_timer_handler)
                .get(timer_view_handler)
                .delete(close_timer_handler),
        )
        .route("/tasks/:id/timer/start", post(start_timer_handler))
        .route("/tasks/:id/timer/pause", post(pause_timer_handler))
        .route("/tasks/:id/timer/reset", post(reset_timer_handler))
        .route("/tasks/:id/timer/settings", post(settings_handler))
        .route("/tasks/:id/timer/preset", post(preset_handler))
        .route("/tasks/:id/timer/custom", post(custom_duration_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
