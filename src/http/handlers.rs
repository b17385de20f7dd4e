use super::state::AppState;
use crate::conversation::{TurnOutcome, TurnPhase};
use crate::error::SessionError;
use crate::session::Plan;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub session_id: String,
    pub phase: TurnPhase,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshPlanResponse {
    /// Whether the backend returned a plan that replaced the current one
    pub refreshed: bool,
    pub plan: Option<Plan>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

fn error_response(e: &SessionError) -> Response {
    let status = match e {
        SessionError::InvalidState(_) => StatusCode::CONFLICT,
        SessionError::Device(_) => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::Network(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
            hint: e.remediation(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /session/record/start
/// Start recording the user's answer, interrupting the AI if it is speaking
pub async fn start_recording(State(state): State<AppState>) -> Response {
    let session = &state.session;

    match session.orchestrator().start_recording().await {
        Ok(()) => {
            info!("Recording started via control API");
            (
                StatusCode::OK,
                Json(StartRecordingResponse {
                    session_id: session.config().session_id.clone(),
                    phase: session.orchestrator().phase(),
                    message: "Recording started".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!("Failed to start recording: {}", e);
            error_response(&e)
        }
    }
}

/// POST /session/record/stop
/// Finish the answer and wait for the AI's reply
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    match state.session.orchestrator().stop_recording().await {
        Ok(outcome) => {
            if outcome == TurnOutcome::Idle {
                info!("Stop requested with no recording in progress");
            }
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(e) => {
            error!("Turn failed: {}", e);
            error_response(&e)
        }
    }
}

/// GET /session/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.stats()))
}

/// GET /session/transcript
/// Visible transcript accumulated so far
pub async fn get_transcript(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.transcript()))
}

/// GET /session/plan
pub async fn get_plan(State(state): State<AppState>) -> Response {
    match state.session.plan() {
        Some(plan) => (StatusCode::OK, Json(plan)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No interview plan for this session".to_string(),
                hint: None,
            }),
        )
            .into_response(),
    }
}

/// POST /session/plan/refresh
/// Re-fetch the plan for the session key issued by the chat service
pub async fn refresh_plan(State(state): State<AppState>) -> Response {
    let session = &state.session;

    match session.orchestrator().refresh_plan().await {
        Ok(refreshed) => {
            info!("Plan refresh via control API: refreshed={}", refreshed);
            (
                StatusCode::OK,
                Json(RefreshPlanResponse {
                    refreshed,
                    plan: session.plan(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!("Plan refresh failed: {}", e);
            error_response(&e)
        }
    }
}

/// POST /session/end
/// Tear the session down and return the final statistics
pub async fn end_session(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.session.end().await;
    (StatusCode::OK, Json(stats))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
