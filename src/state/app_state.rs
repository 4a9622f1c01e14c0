//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::{clock::Clock, error::FocusError, storage::SnapshotStore};
use super::{ActivePhase, DerivedView, FocusEngine, PhaseAdvance, TimerState};

/// Result of applying a command to the focus engine
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// False when the command was a no-op (e.g. start while running)
    pub changed: bool,
    pub view: DerivedView,
}

/// Application-scoped service object, built once at startup and shared
/// by the HTTP handlers and background tasks
#[derive(Debug)]
pub struct AppState {
    /// The focus timer state machine
    engine: Mutex<FocusEngine>,
    store: SnapshotStore,
    clock: Arc<dyn Clock>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Every committed state change, so the tick task can reschedule
    pub state_change_tx: broadcast::Sender<TimerState>,
    /// Latest derived view
    pub view_tx: watch::Sender<DerivedView>,
    /// Keep the receiver alive to prevent channel closure
    pub _view_rx: watch::Receiver<DerivedView>,
}

impl AppState {
    /// Create the application state from whatever snapshot the store holds
    pub fn new(port: u16, host: String, store: SnapshotStore, clock: Arc<dyn Clock>) -> Self {
        let engine = FocusEngine::new(store.load());
        let view = DerivedView::compute(engine.state(), clock.now_ms());
        let (state_change_tx, _) = broadcast::channel(100);
        let (view_tx, view_rx) = watch::channel(view);

        Self {
            engine: Mutex::new(engine),
            store,
            clock,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            state_change_tx,
            view_tx,
            _view_rx: view_rx,
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    fn lock_engine(&self) -> Result<MutexGuard<'_, FocusEngine>, FocusError> {
        self.engine
            .lock()
            .map_err(|_| FocusError::LockPoisoned("focus engine"))
    }

    /// Apply a command to the engine, then persist and notify if it changed anything
    pub fn apply<F>(&self, action: &str, op: F) -> Result<CommandOutcome, FocusError>
    where
        F: FnOnce(&mut FocusEngine, i64) -> bool,
    {
        let now = self.clock.now_ms();
        let mut engine = self.lock_engine()?;

        let adopted = self.adopt_external(&mut engine);
        let changed = op(&mut *engine, now);
        let snapshot = engine.state().clone();
        if changed {
            // Persist while still holding the engine so a concurrent sync
            // cannot slip an older snapshot in between
            self.persist(&snapshot);
        }
        drop(engine);

        let view = DerivedView::compute(&snapshot, now);
        if changed || adopted {
            self.notify(snapshot, view.clone());
        } else {
            debug!("Focus command '{}' left the state unchanged", action);
        }

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        Ok(CommandOutcome { changed, view })
    }

    pub fn start(&self) -> Result<CommandOutcome, FocusError> {
        info!("Starting focus timer");
        self.apply("start", |engine, now| engine.start(now))
    }

    pub fn pause(&self) -> Result<CommandOutcome, FocusError> {
        info!("Pausing focus timer");
        self.apply("pause", |engine, now| engine.pause(now))
    }

    pub fn toggle(&self) -> Result<CommandOutcome, FocusError> {
        info!("Toggling focus timer");
        self.apply("toggle", |engine, now| engine.toggle(now))
    }

    pub fn reset(&self) -> Result<CommandOutcome, FocusError> {
        info!("Resetting focus timer");
        self.apply("reset", |engine, _| engine.reset())
    }

    pub fn skip(&self) -> Result<CommandOutcome, FocusError> {
        self.apply("skip", |engine, _| {
            let advance = engine.skip();
            info!("Skipped {:?} phase, now in {:?}", advance.from, advance.to);
            true
        })
    }

    pub fn set_preset(&self, work_minutes: i64, break_minutes: i64) -> Result<CommandOutcome, FocusError> {
        info!("Setting focus preset: work={}min, break={}min", work_minutes, break_minutes);
        self.apply("preset", |engine, _| engine.set_preset(work_minutes, break_minutes))
    }

    pub fn set_auto_start_next(&self, enabled: bool) -> Result<CommandOutcome, FocusError> {
        info!("Setting auto-start of next phase to: {}", enabled);
        self.apply("auto-start", |engine, _| engine.set_auto_start_next(enabled))
    }

    pub fn set_phase(&self, phase: ActivePhase) -> Result<CommandOutcome, FocusError> {
        info!("Setting focus phase to: {:?}", phase);
        self.apply("phase", |engine, _| engine.set_phase(phase))
    }

    /// Recompute the view and advance the phase if the countdown has expired
    pub fn tick(&self) -> Result<(DerivedView, Option<PhaseAdvance>), FocusError> {
        let now = self.clock.now_ms();
        let mut engine = self.lock_engine()?;

        let adopted = self.adopt_external(&mut engine);
        let advance = engine.tick(now);
        let snapshot = engine.state().clone();
        if advance.is_some() {
            self.persist(&snapshot);
        }
        drop(engine);

        let view = DerivedView::compute(&snapshot, now);
        if let Some(advance) = advance {
            info!(
                "Focus phase {:?} completed, now in {:?} (auto-started: {})",
                advance.from, advance.to, advance.auto_started
            );
        }
        if advance.is_some() || adopted {
            self.notify(snapshot, view.clone());
        } else {
            self.view_tx.send_replace(view.clone());
        }

        Ok((view, advance))
    }

    /// Adopt a snapshot written by another instance, replacing local state wholesale
    pub fn sync_from_store(&self) -> Result<bool, FocusError> {
        let mut engine = self.lock_engine()?;
        let Some(external) = self.store.poll_external()? else {
            return Ok(false);
        };

        engine.replace(external);
        let snapshot = engine.state().clone();
        drop(engine);

        info!("Adopted focus snapshot written by another instance");
        let view = DerivedView::compute(&snapshot, self.clock.now_ms());
        self.notify(snapshot, view);
        Ok(true)
    }

    /// Epoch milliseconds at which the running countdown expires
    pub fn next_deadline(&self) -> Result<Option<i64>, FocusError> {
        Ok(self.lock_engine()?.deadline())
    }

    pub fn get_timer_state(&self) -> Result<TimerState, FocusError> {
        Ok(self.lock_engine()?.state().clone())
    }

    /// Current derived view computed against the clock right now
    pub fn get_view(&self) -> Result<DerivedView, FocusError> {
        let state = self.get_timer_state()?;
        Ok(DerivedView::compute(&state, self.clock.now_ms()))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Replace the engine's state with a newer snapshot from another instance, if any.
    /// Must be called with the engine locked.
    fn adopt_external(&self, engine: &mut FocusEngine) -> bool {
        match self.store.poll_external() {
            Ok(Some(external)) => {
                info!("Adopted focus snapshot written by another instance");
                engine.replace(external);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to check shared focus snapshot: {}", e);
                false
            }
        }
    }

    fn persist(&self, state: &TimerState) {
        if let Err(e) = self.store.save(state) {
            error!("Failed to persist focus snapshot to {}: {}", self.store.path().display(), e);
        }
    }

    fn notify(&self, state: TimerState, view: DerivedView) {
        self.view_tx.send_replace(view);
        if let Err(e) = self.state_change_tx.send(state) {
            debug!("No listeners for focus state change: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, state::Phase};
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    const T0: i64 = 1_700_000_000_000;

    fn instance(dir: &Path, clock: &Arc<ManualClock>) -> AppState {
        AppState::new(0, "127.0.0.1".to_string(), SnapshotStore::new(dir), clock.clone())
    }

    fn app() -> (AppState, Arc<ManualClock>, TempDir) {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(T0));
        let state = instance(dir.path(), &clock);
        (state, clock, dir)
    }

    #[test]
    fn commands_persist_every_change() {
        let (state, clock, dir) = app();
        state.set_preset(50, 10).unwrap();
        state.start().unwrap();
        clock.advance(2_999);

        let reloaded = SnapshotStore::new(dir.path()).load();
        assert_eq!(reloaded, state.get_timer_state().unwrap());
        assert_eq!(state.get_view().unwrap().mmss, "49:58");
    }

    #[test]
    fn redundant_start_reports_no_change() {
        let (state, _clock, _dir) = app();
        assert!(state.start().unwrap().changed);
        assert!(!state.start().unwrap().changed);
        assert_eq!(state.get_last_action().0.as_deref(), Some("start"));
    }

    #[test]
    fn tick_advances_expired_phase_and_publishes_view() {
        let (state, clock, dir) = app();
        state.set_auto_start_next(true).unwrap();
        state.start().unwrap();
        clock.advance(1_500_000);

        let (view, advance) = state.tick().unwrap();
        let advance = advance.unwrap();
        assert_eq!(advance.to, ActivePhase::Break);
        assert!(advance.auto_started);
        assert_eq!(view.label, "BREAK");
        assert_eq!(view.remaining_sec, 300);
        assert_eq!(*state.view_tx.borrow(), view);
        assert_eq!(SnapshotStore::new(dir.path()).load().cycles_completed, 1);
    }

    #[test]
    fn sync_adopts_other_instance_snapshot() {
        let (state, clock, dir) = app();
        state.start().unwrap();

        let other = instance(dir.path(), &clock);
        clock.advance(60_000);
        other.pause().unwrap();
        other.skip().unwrap();

        assert!(state.sync_from_store().unwrap());
        let adopted = state.get_timer_state().unwrap();
        assert_eq!(adopted, other.get_timer_state().unwrap());
        assert_eq!(adopted.phase, Phase::Break);
        assert!(!state.sync_from_store().unwrap());
    }

    #[test]
    fn command_builds_on_latest_snapshot_from_other_instance() {
        let (first, clock, dir) = app();
        first.start().unwrap();

        let second = instance(dir.path(), &clock);
        clock.advance(60_000);
        first.pause().unwrap();

        // The second instance has not synced since the pause
        second.set_auto_start_next(true).unwrap();
        first.sync_from_store().unwrap();

        for state in [&first, &second] {
            let timer = state.get_timer_state().unwrap();
            assert!(!timer.running);
            assert!(timer.auto_start_next);
            assert_eq!(timer.remaining_sec, 1440);
        }
    }

    #[test]
    fn tick_sees_other_instance_pause_before_expiry() {
        let (first, clock, dir) = app();
        first.start().unwrap();

        let second = instance(dir.path(), &clock);
        clock.advance(60_000);
        second.pause().unwrap();
        clock.advance(1_500_000);

        let (view, advance) = first.tick().unwrap();
        assert!(advance.is_none());
        assert!(!view.running);
        assert_eq!(view.remaining_sec, 1440);
    }

    #[test]
    fn restart_resumes_running_countdown() {
        let (state, clock, dir) = app();
        state.start().unwrap();
        clock.advance(90_000);

        let restarted = instance(dir.path(), &clock);
        let view = restarted.get_view().unwrap();
        assert!(view.running);
        assert_eq!(view.remaining_sec, 1410);
    }
}
