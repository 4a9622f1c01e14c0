//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use tracing::{error, warn};

use crate::{
    error::FocusError,
    state::{AppState, CommandOutcome, DerivedView},
};
use super::responses::{
    AutoStartRequest, CommandResponse, HealthResponse, PhaseRequest, PresetRequest,
    SnapshotResponse, StatusResponse,
};

type CommandResult = Result<Json<CommandResponse>, StatusCode>;

fn command_response(
    result: Result<CommandOutcome, FocusError>,
    applied: &str,
    ignored: &str,
) -> CommandResult {
    match result {
        Ok(outcome) => {
            let message = if outcome.changed { applied } else { ignored };
            Ok(Json(CommandResponse::new(
                message.to_string(),
                outcome.changed,
                outcome.view,
            )))
        }
        Err(e) => {
            error!("Focus command failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>, endpoint: &str) -> Result<T, StatusCode> {
    match body {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            warn!("Rejected {} request body: {}", endpoint, rejection);
            Err(StatusCode::UNPROCESSABLE_ENTITY)
        }
    }
}

/// Handle GET /focus - Current derived view
pub async fn view_handler(State(state): State<Arc<AppState>>) -> Result<Json<DerivedView>, StatusCode> {
    state.get_view().map(Json).map_err(|e| {
        error!("Failed to compute focus view: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Handle GET /focus/state - Raw persisted snapshot
pub async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Result<Json<SnapshotResponse>, StatusCode> {
    match state.get_timer_state() {
        Ok(snapshot) => Ok(Json(SnapshotResponse {
            snapshot,
            timestamp: Utc::now(),
        })),
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /focus/start - Start or resume the countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_response(state.start(), "Focus timer started", "Focus timer already running")
}

/// Handle POST /focus/pause - Pause the countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_response(state.pause(), "Focus timer paused", "Focus timer is not running")
}

/// Handle POST /focus/toggle - Pause if running, start otherwise
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_response(state.toggle(), "Focus timer toggled", "Focus timer unchanged")
}

/// Handle POST /focus/reset - Back to idle
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_response(state.reset(), "Focus timer reset", "Focus timer already reset")
}

/// Handle POST /focus/skip - Jump to the opposite phase
pub async fn skip_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_response(state.skip(), "Skipped to next phase", "Phase unchanged")
}

/// Handle PUT /focus/preset - Reconfigure phase durations
pub async fn preset_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PresetRequest>, JsonRejection>,
) -> CommandResult {
    let preset = parse_body(body, "preset")?;
    command_response(
        state.set_preset(preset.work_minutes, preset.break_minutes),
        "Focus preset updated",
        "Focus preset unchanged (timer running or same values)",
    )
}

/// Handle PUT /focus/auto-start - Toggle automatic start of the next phase
pub async fn auto_start_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AutoStartRequest>, JsonRejection>,
) -> CommandResult {
    let request = parse_body(body, "auto-start")?;
    command_response(
        state.set_auto_start_next(request.enabled),
        "Auto-start updated",
        "Auto-start unchanged",
    )
}

/// Handle PUT /focus/phase - Select WORK or BREAK directly
pub async fn phase_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PhaseRequest>, JsonRejection>,
) -> CommandResult {
    let request = parse_body(body, "phase")?;
    command_response(
        state.set_phase(request.phase),
        "Focus phase selected",
        "Focus phase unchanged (timer running or already selected)",
    )
}

/// Handle GET /status - Current view plus server metadata
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let focus = match state.get_view() {
        Ok(view) => view,
        Err(e) => {
            error!("Failed to compute focus view: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        focus,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
