//! Timer state structure, clamping, and lenient snapshot decoding

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Upper bound for any remaining-seconds value (one day)
pub const MAX_REMAINING_SEC: u32 = 24 * 60 * 60;
pub const MIN_WORK_SEC: u32 = 60;
pub const MAX_WORK_SEC: u32 = 6 * 60 * 60;
pub const MIN_BREAK_SEC: u32 = 60;
pub const MAX_BREAK_SEC: u32 = 2 * 60 * 60;
pub const DEFAULT_WORK_SEC: u32 = 25 * 60;
pub const DEFAULT_BREAK_SEC: u32 = 5 * 60;

/// Current segment of the focus/break cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Idle,
    Work,
    Break,
}

/// A phase that can be counted down; IDLE never is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivePhase {
    Work,
    Break,
}

impl Phase {
    /// The phase a countdown actually runs in (IDLE counts as WORK)
    pub fn effective(self) -> ActivePhase {
        match self {
            Phase::Break => ActivePhase::Break,
            Phase::Idle | Phase::Work => ActivePhase::Work,
        }
    }

    fn from_wire(value: &str) -> Option<Self> {
        match value {
            "IDLE" => Some(Phase::Idle),
            "WORK" => Some(Phase::Work),
            "BREAK" => Some(Phase::Break),
            _ => None,
        }
    }
}

impl ActivePhase {
    pub fn opposite(self) -> Self {
        match self {
            ActivePhase::Work => ActivePhase::Break,
            ActivePhase::Break => ActivePhase::Work,
        }
    }
}

impl From<ActivePhase> for Phase {
    fn from(phase: ActivePhase) -> Self {
        match phase {
            ActivePhase::Work => Phase::Work,
            ActivePhase::Break => Phase::Break,
        }
    }
}

/// The persisted, authoritative timer record.
///
/// Serializes to the snapshot wire format (camelCase keys, `endAt` as a
/// number or `null`). Decoding goes through [`TimerState::from_json_slice`]
/// so that damaged snapshots degrade to defaults field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub phase: Phase,
    pub running: bool,
    /// Epoch milliseconds at which the running countdown hits zero
    pub end_at: Option<i64>,
    /// Authoritative only while paused or idle
    pub remaining_sec: u32,
    pub work_sec: u32,
    pub break_sec: u32,
    pub auto_start_next: bool,
    pub cycles_completed: u64,
}

impl TimerState {
    /// Create the first-use state: idle, 25 minutes of work, 5 minutes of break
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            running: false,
            end_at: None,
            remaining_sec: DEFAULT_WORK_SEC,
            work_sec: DEFAULT_WORK_SEC,
            break_sec: DEFAULT_BREAK_SEC,
            auto_start_next: false,
            cycles_completed: 0,
        }
    }

    /// Configured duration of a phase in seconds
    pub fn duration_of(&self, phase: ActivePhase) -> u32 {
        match phase {
            ActivePhase::Work => self.work_sec,
            ActivePhase::Break => self.break_sec,
        }
    }

    /// Remaining seconds at `now_ms`, rounded up while running so the
    /// countdown never reads zero before the deadline has actually passed
    pub fn remaining_at(&self, now_ms: i64) -> u32 {
        match (self.running, self.end_at) {
            (true, Some(end_at)) => {
                let diff = end_at.saturating_sub(now_ms);
                let secs = diff.div_euclid(1000) + i64::from(diff.rem_euclid(1000) > 0);
                secs.clamp(0, i64::from(MAX_REMAINING_SEC)) as u32
            }
            _ => self.remaining_sec.min(MAX_REMAINING_SEC),
        }
    }

    /// Bring every field back inside its valid range. Idempotent.
    pub fn sanitized(mut self) -> Self {
        self.work_sec = self.work_sec.clamp(MIN_WORK_SEC, MAX_WORK_SEC);
        self.break_sec = self.break_sec.clamp(MIN_BREAK_SEC, MAX_BREAK_SEC);
        self.remaining_sec = self.remaining_sec.min(MAX_REMAINING_SEC);
        match (self.running, self.end_at) {
            (true, None) => self.running = false,
            (false, Some(_)) => self.end_at = None,
            _ => {}
        }
        self
    }

    /// Decode a snapshot without ever failing.
    ///
    /// Invalid JSON yields defaults; an object keeps each field that has the
    /// right type and falls back to the default for the rest.
    pub fn from_json_slice(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => Self::from_fields(&map),
            Ok(other) => {
                tracing::warn!("Focus snapshot is not an object ({}), using defaults", kind_of(&other));
                Self::new()
            }
            Err(e) => {
                tracing::warn!("Focus snapshot is not valid JSON ({}), using defaults", e);
                Self::new()
            }
        }
    }

    fn from_fields(map: &Map<String, Value>) -> Self {
        let base = Self::new();

        let phase = map
            .get("phase")
            .and_then(Value::as_str)
            .and_then(Phase::from_wire)
            .unwrap_or(base.phase);
        let running = map.get("running").and_then(Value::as_bool).unwrap_or(base.running);
        let end_at = number(map, "endAt").map(|n| n.floor() as i64);
        let remaining_sec = number(map, "remainingSec")
            .map(|n| clamp_floor(n, 0, MAX_REMAINING_SEC))
            .unwrap_or(base.remaining_sec);
        let work_sec = number(map, "workSec")
            .map(|n| clamp_floor(n, MIN_WORK_SEC, MAX_WORK_SEC))
            .unwrap_or(base.work_sec);
        let break_sec = number(map, "breakSec")
            .map(|n| clamp_floor(n, MIN_BREAK_SEC, MAX_BREAK_SEC))
            .unwrap_or(base.break_sec);
        let auto_start_next = map
            .get("autoStartNext")
            .and_then(Value::as_bool)
            .unwrap_or(base.auto_start_next);
        let cycles_completed = number(map, "cyclesCompleted")
            .map(|n| n.floor().max(0.0) as u64)
            .unwrap_or(base.cycles_completed);

        Self {
            phase,
            running,
            end_at,
            remaining_sec,
            work_sec,
            break_sec,
            auto_start_next,
            cycles_completed,
        }
        .sanitized()
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a seconds value expressed in a wider integer into `[lo, hi]`
pub fn clamp_secs(value: i64, lo: u32, hi: u32) -> u32 {
    value.clamp(i64::from(lo), i64::from(hi)) as u32
}

fn number(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64).filter(|n| n.is_finite())
}

fn clamp_floor(value: f64, lo: u32, hi: u32) -> u32 {
    value.floor().clamp(f64::from(lo), f64::from(hi)) as u32
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
