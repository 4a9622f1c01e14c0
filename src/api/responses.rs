//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{ActivePhase, DerivedView, Phase, TimerState};

/// Response structure for focus command endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// False when the command did not change anything
    pub changed: bool,
    pub focus: DerivedView,
}

impl CommandResponse {
    /// Create a response whose status reflects the resulting view
    pub fn new(message: String, changed: bool, focus: DerivedView) -> Self {
        let status = if focus.running {
            "running"
        } else if focus.phase == Phase::Idle {
            "idle"
        } else {
            "paused"
        };

        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            changed,
            focus,
        }
    }
}

/// Response for the raw snapshot endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResponse {
    pub snapshot: TimerState,
    pub timestamp: DateTime<Utc>,
}

/// Status response with server metadata
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub focus: DerivedView,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetRequest {
    pub work_minutes: i64,
    pub break_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoStartRequest {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhaseRequest {
    pub phase: ActivePhase,
}
