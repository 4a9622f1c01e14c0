//! Focus timer tick background task

use std::{sync::Arc, time::Duration};
use tokio::{sync::broadcast::error::RecvError, time::sleep};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Background task that refreshes the derived view and fires natural expiry.
///
/// Runs every `tick` but also wakes exactly at a running countdown's deadline
/// when that comes sooner, and immediately after any state change.
pub async fn focus_tick_task(state: Arc<AppState>, tick: Duration) {
    info!("Starting focus tick task ({}ms)", tick.as_millis());

    let mut state_rx = state.state_change_tx.subscribe();

    loop {
        if let Err(e) = state.tick() {
            error!("Failed to tick focus timer: {}", e);
        }

        let wait = match state.next_deadline() {
            Ok(Some(deadline)) => until_deadline(deadline, state.now_ms()).min(tick),
            Ok(None) => tick,
            Err(e) => {
                error!("Failed to read focus deadline: {}", e);
                tick
            }
        };

        tokio::select! {
            _ = sleep(wait) => {}
            changed = state_rx.recv() => match changed {
                Ok(_) => debug!("Focus state changed, recomputing"),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Focus tick task skipped {} state changes", skipped);
                }
                Err(RecvError::Closed) => {
                    info!("State change channel closed, stopping focus tick task");
                    break;
                }
            },
        }
    }
}

fn until_deadline(deadline_ms: i64, now_ms: i64) -> Duration {
    Duration::from_millis(deadline_ms.saturating_sub(now_ms).max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        state::Phase,
        storage::SnapshotStore,
    };

    #[test]
    fn deadline_wait_never_negative() {
        assert_eq!(until_deadline(1_000, 5_000), Duration::ZERO);
        assert_eq!(until_deadline(5_250, 5_000), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn expired_countdown_advances_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let state = Arc::new(AppState::new(
            0,
            "127.0.0.1".to_string(),
            SnapshotStore::new(dir.path()),
            clock.clone(),
        ));
        state.start().unwrap();
        clock.advance(1_500_000);

        let task = tokio::spawn(focus_tick_task(Arc::clone(&state), Duration::from_millis(10)));
        let mut view_rx = state.view_tx.subscribe();
        tokio::time::timeout(Duration::from_secs(5), view_rx.wait_for(|view| view.phase == Phase::Break))
            .await
            .expect("tick task did not advance the phase")
            .unwrap();
        task.abort();

        let timer = state.get_timer_state().unwrap();
        assert_eq!(timer.cycles_completed, 1);
        assert!(!timer.running);
    }
}
