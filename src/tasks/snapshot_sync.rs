//! Cross-instance snapshot synchronization background task

use std::{sync::Arc, time::Duration};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Background task that watches the shared snapshot for writes made by other
/// instances and adopts them wholesale
pub async fn snapshot_sync_task(state: Arc<AppState>, period: Duration) {
    info!("Starting snapshot sync task ({}ms)", period.as_millis());

    let mut interval = interval(period);

    loop {
        interval.tick().await;

        match state.sync_from_store() {
            Ok(true) => debug!("Focus state replaced from shared snapshot"),
            Ok(false) => {}
            Err(e) => warn!("Failed to check shared focus snapshot: {}", e),
        }
    }
}
