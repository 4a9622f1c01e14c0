//! Focus timer state machine
//!
//! Every operation takes the current wall-clock time explicitly and reports
//! whether it changed the state, so callers decide when to persist and notify.

use super::timer_state::{
    clamp_secs, ActivePhase, Phase, TimerState, MAX_BREAK_SEC, MAX_WORK_SEC, MIN_BREAK_SEC,
    MIN_WORK_SEC,
};

/// Record of a phase transition caused by a skip or a natural expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseAdvance {
    pub from: ActivePhase,
    pub to: ActivePhase,
    pub auto_started: bool,
}

/// Owns the timer state and applies commands to it
#[derive(Debug, Clone, Default)]
pub struct FocusEngine {
    state: TimerState,
}

impl FocusEngine {
    pub fn new(state: TimerState) -> Self {
        Self {
            state: state.sanitized(),
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Replace the whole state, e.g. with a snapshot written by another instance
    pub fn replace(&mut self, state: TimerState) {
        self.state = state.sanitized();
    }

    pub fn remaining_at(&self, now_ms: i64) -> u32 {
        self.state.remaining_at(now_ms)
    }

    /// Epoch milliseconds of the running countdown's deadline
    pub fn deadline(&self) -> Option<i64> {
        if self.state.running {
            self.state.end_at
        } else {
            None
        }
    }

    /// Start counting down. IDLE starts a WORK phase; a paused timer sitting
    /// at zero restarts its phase from the full duration.
    pub fn start(&mut self, now_ms: i64) -> bool {
        if self.state.running {
            return false;
        }
        let phase = self.state.phase.effective();
        let remaining = match self.state.remaining_sec {
            0 => self.state.duration_of(phase),
            secs => secs,
        };
        self.state.phase = phase.into();
        self.state.remaining_sec = remaining;
        self.state.end_at = Some(deadline_after(now_ms, remaining));
        self.state.running = true;
        true
    }

    pub fn pause(&mut self, now_ms: i64) -> bool {
        if !self.state.running {
            return false;
        }
        self.state.remaining_sec = self.state.remaining_at(now_ms);
        self.state.running = false;
        self.state.end_at = None;
        true
    }

    pub fn toggle(&mut self, now_ms: i64) -> bool {
        if self.state.running {
            self.pause(now_ms)
        } else {
            self.start(now_ms)
        }
    }

    /// Back to IDLE with a full work duration, from any state
    pub fn reset(&mut self) -> bool {
        let before = self.state.clone();
        self.state.phase = Phase::Idle;
        self.state.running = false;
        self.state.end_at = None;
        self.state.remaining_sec = self.state.work_sec;
        self.state != before
    }

    /// Jump to the opposite phase and stop there
    pub fn skip(&mut self) -> PhaseAdvance {
        self.advance(None)
    }

    /// Detect natural expiry of the running countdown and advance the phase.
    /// With auto-start enabled the next phase begins counting at `now_ms`.
    pub fn tick(&mut self, now_ms: i64) -> Option<PhaseAdvance> {
        self.deadline()?;
        if self.state.remaining_at(now_ms) > 0 {
            return None;
        }
        let start_at = self.state.auto_start_next.then_some(now_ms);
        Some(self.advance(start_at))
    }

    /// Reconfigure phase durations; ignored while a countdown is running
    pub fn set_preset(&mut self, work_minutes: i64, break_minutes: i64) -> bool {
        if self.state.running {
            return false;
        }
        let before = self.state.clone();
        self.state.work_sec = clamp_secs(work_minutes.saturating_mul(60), MIN_WORK_SEC, MAX_WORK_SEC);
        self.state.break_sec =
            clamp_secs(break_minutes.saturating_mul(60), MIN_BREAK_SEC, MAX_BREAK_SEC);
        if self.state.phase == Phase::Idle {
            self.state.remaining_sec = self.state.work_sec;
        }
        self.state != before
    }

    pub fn set_auto_start_next(&mut self, enabled: bool) -> bool {
        let changed = self.state.auto_start_next != enabled;
        self.state.auto_start_next = enabled;
        changed
    }

    /// Select a phase directly; ignored while a countdown is running
    pub fn set_phase(&mut self, phase: ActivePhase) -> bool {
        if self.state.running {
            return false;
        }
        let before = self.state.clone();
        self.state.phase = phase.into();
        self.state.remaining_sec = self.state.duration_of(phase);
        self.state.end_at = None;
        self.state != before
    }

    fn advance(&mut self, start_at: Option<i64>) -> PhaseAdvance {
        let from = self.state.phase.effective();
        let to = from.opposite();
        let duration = self.state.duration_of(to);

        if from == ActivePhase::Work {
            self.state.cycles_completed = self.state.cycles_completed.saturating_add(1);
        }
        self.state.phase = to.into();
        self.state.remaining_sec = duration;
        self.state.running = start_at.is_some();
        self.state.end_at = start_at.map(|now_ms| deadline_after(now_ms, duration));

        PhaseAdvance {
            from,
            to,
            auto_started: start_at.is_some(),
        }
    }
}

fn deadline_after(now_ms: i64, secs: u32) -> i64 {
    now_ms.saturating_add(i64::from(secs) * 1000)
}
