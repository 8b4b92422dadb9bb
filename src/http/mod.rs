//! HTTP API for remote control
//!
//! This module provides a REST API around the recorder:
//! - POST /remote/:action - START_GPS / STOP_GPS toggle, SEND_EVENT marker
//! - GET /recording/status - Recording status
//! - GET /recording/latest - Latest sample
//! - GET /recording/samples - Samples of the current session
//! - POST /events - Send a named event
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ErrorResponse, RemoteResponse, SendEventRequest};
pub use routes::create_router;
pub use state::AppState;
