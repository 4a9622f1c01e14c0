//! Read-only presentation data computed from the timer state and the clock

use serde::Serialize;

use super::timer_state::{Phase, TimerState, MAX_REMAINING_SEC};

/// Snapshot of everything a display needs; recomputed, never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedView {
    pub phase: Phase,
    pub running: bool,
    pub remaining_sec: u32,
    pub mmss: String,
    pub label: &'static str,
    /// Elapsed fraction of the current phase in [0, 1]
    pub progress: f64,
    pub work_min: u32,
    pub break_min: u32,
    pub cycles_completed: u64,
    pub auto_start_next: bool,
}

impl DerivedView {
    pub fn compute(state: &TimerState, now_ms: i64) -> Self {
        let remaining_sec = state.remaining_at(now_ms);
        let duration = state.duration_of(state.phase.effective());

        let progress = match state.phase {
            Phase::Idle => 0.0,
            _ if duration == 0 => 0.0,
            _ => (1.0 - f64::from(remaining_sec) / f64::from(duration)).clamp(0.0, 1.0),
        };

        Self {
            phase: state.phase,
            running: state.running,
            remaining_sec,
            mmss: format_mmss(remaining_sec),
            label: label_for(state.phase),
            progress,
            work_min: whole_minutes(state.work_sec),
            break_min: whole_minutes(state.break_sec),
            cycles_completed: state.cycles_completed,
            auto_start_next: state.auto_start_next,
        }
    }
}

impl Default for DerivedView {
    fn default() -> Self {
        Self::compute(&TimerState::new(), 0)
    }
}

/// Format seconds as `MM:SS`; minutes grow past two digits for long phases
pub fn format_mmss(total_sec: u32) -> String {
    let secs = total_sec.min(MAX_REMAINING_SEC);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn label_for(phase: Phase) -> &'static str {
    match phase {
        Phase::Work => "FOCUS",
        Phase::Break => "BREAK",
        Phase::Idle => "IDLE",
    }
}

fn whole_minutes(secs: u32) -> u32 {
    (f64::from(secs) / 60.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FocusEngine;
    use rstest::rstest;

    const T0: i64 = 1_700_000_000_000;

    #[rstest]
    #[case(0, "00:00")]
    #[case(59, "00:59")]
    #[case(1500, "25:00")]
    #[case(2997, "49:57")]
    #[case(21_600, "360:00")]
    #[case(u32::MAX, "1440:00")]
    fn mmss_formatting(#[case] secs: u32, #[case] expected: &str) {
        assert_eq!(format_mmss(secs), expected);
    }

    #[test]
    fn idle_view() {
        let view = DerivedView::compute(&TimerState::new(), T0);
        assert_eq!(view.label, "IDLE");
        assert_eq!(view.mmss, "25:00");
        assert_eq!(view.progress, 0.0);
        assert_eq!(view.work_min, 25);
        assert_eq!(view.break_min, 5);
        assert!(!view.running);
    }

    #[test]
    fn preset_start_scenario() {
        let mut engine = FocusEngine::default();
        engine.set_preset(50, 10);
        engine.start(T0);

        let view = DerivedView::compute(engine.state(), T0 + 2_999);
        assert_eq!(view.remaining_sec, 2_998);
        assert_eq!(view.mmss, "49:58");
        assert_eq!(view.label, "FOCUS");
        assert_eq!(view.work_min, 50);
        assert_eq!(view.break_min, 10);

        let view = DerivedView::compute(engine.state(), T0 + 3_000);
        assert_eq!(view.remaining_sec, 2_997);
        assert_eq!(view.mmss, "49:57");
    }

    #[test]
    fn progress_tracks_elapsed_fraction() {
        let mut engine = FocusEngine::default();
        engine.start(T0);
        let view = DerivedView::compute(engine.state(), T0 + 750_000);
        assert!((view.progress - 0.5).abs() < 1e-9);

        let done = DerivedView::compute(engine.state(), T0 + 10_000_000);
        assert_eq!(done.progress, 1.0);
        assert_eq!(done.remaining_sec, 0);
    }

    #[test]
    fn paused_break_reports_break_label() {
        let state = TimerState {
            phase: Phase::Break,
            remaining_sec: 150,
            ..TimerState::new()
        };
        let view = DerivedView::compute(&state, T0);
        assert_eq!(view.label, "BREAK");
        assert!((view.progress - 0.5).abs() < 1e-9);
    }

    #[test]
    fn remaining_longer_than_phase_clamps_progress_to_zero() {
        let state = TimerState {
            phase: Phase::Work,
            remaining_sec: 5_000,
            ..TimerState::new()
        };
        assert_eq!(DerivedView::compute(&state, T0).progress, 0.0);
    }

    #[test]
    fn view_serializes_in_camel_case() {
        let json = serde_json::to_value(DerivedView::default()).unwrap();
        assert_eq!(json["remainingSec"], 1500);
        assert_eq!(json["phase"], "IDLE");
        assert_eq!(json["autoStartNext"], false);
    }
}
