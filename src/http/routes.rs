use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Remote control (toggle, marker)
        .route("/remote/:action", post(handlers::remote_action))
        // Recording queries
        .route("/recording/status", get(handlers::get_status))
        .route("/recording/latest", get(handlers::get_latest_sample))
        .route("/recording/samples", get(handlers::get_samples))
        // Manual events
        .route("/events", post(handlers::send_event))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
