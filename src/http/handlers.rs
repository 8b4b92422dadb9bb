use super::state::AppState;
use crate::events::Event;
use crate::location::ReconciledSample;
use crate::recording::RecordingStatus;
use crate::remote::append_marker;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoteResponse {
    pub action: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendEventRequest {
    /// Custom event name; when absent the name comes from geocoding
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /remote/:action
/// Remote broadcast receiver: START_GPS / STOP_GPS toggle, SEND_EVENT marks
pub async fn remote_action(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> impl IntoResponse {
    info!("Received remote action: {}", action);

    match action.as_str() {
        "START_GPS" | "STOP_GPS" => {
            state.coordinator.trigger();
            (
                StatusCode::ACCEPTED,
                Json(RemoteResponse {
                    action,
                    message: "Toggle triggered".to_string(),
                }),
            )
                .into_response()
        }
        "SEND_EVENT" => {
            let dir = state.recorder.output_dir();
            match append_marker(&dir, Utc::now().timestamp_millis()).await {
                Ok(path) => (
                    StatusCode::OK,
                    Json(RemoteResponse {
                        action,
                        message: format!("Marker saved to {}", path.display()),
                    }),
                )
                    .into_response(),
                Err(e) => {
                    error!("Error writing marker: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ErrorResponse {
                            error: format!("Failed to write marker: {}", e),
                        }),
                    )
                        .into_response()
                }
            }
        }
        _ => {
            warn!("Unknown remote action: {}", action);
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Unknown action {}", action),
                }),
            )
                .into_response()
        }
    }
}

/// GET /recording/status
pub async fn get_status(State(state): State<AppState>) -> Json<RecordingStatus> {
    Json(state.recorder.status())
}

/// GET /recording/latest
pub async fn get_latest_sample(State(state): State<AppState>) -> impl IntoResponse {
    match state.recorder.latest_sample() {
        Some(sample) => (StatusCode::OK, Json(sample)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No samples recorded yet".to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /recording/samples
/// All samples of the current session
pub async fn get_samples(State(state): State<AppState>) -> Json<Vec<ReconciledSample>> {
    Json(state.recorder.samples())
}

/// POST /events
/// Send a named event (geocoded name when none is given)
pub async fn send_event(
    State(state): State<AppState>,
    body: Option<Json<SendEventRequest>>,
) -> Json<Event> {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    Json(state.recorder.send_event(request.name).await)
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
