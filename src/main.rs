//! Cyber Heaven Focus - a local focus timer daemon
//! 
//! This is the main entry point for the focusd server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use cyber_heaven_focus::{
    api::create_router,
    config::Config,
    state::AppState,
    storage::SnapshotStore,
    tasks::{focus_tick_task, snapshot_sync_task},
    utils::shutdown_signal,
    SystemClock,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("cyber_heaven_focus={},focusd={},tower_http=info", config.log_level(), config.log_level()))
        .init();

    info!("Starting focusd v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, state_dir={}, tick={}ms, sync={}ms",
          config.host, config.port, config.state_dir.display(), config.tick_ms, config.sync_ms);

    // Create application state from the persisted snapshot
    let store = SnapshotStore::new(&config.state_dir);
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        store,
        Arc::new(SystemClock),
    ));

    // Start the background tasks
    let tick_state = Arc::clone(&state);
    let tick_interval = config.tick_interval();
    tokio::spawn(async move {
        focus_tick_task(tick_state, tick_interval).await;
    });

    let sync_state = Arc::clone(&state);
    let sync_interval = config.sync_interval();
    tokio::spawn(async move {
        snapshot_sync_task(sync_state, sync_interval).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /focus            - Current timer view");
    info!("  GET  /focus/state      - Raw timer snapshot");
    info!("  POST /focus/start      - Start or resume");
    info!("  POST /focus/pause      - Pause");
    info!("  POST /focus/toggle     - Pause or start");
    info!("  POST /focus/reset      - Back to idle");
    info!("  POST /focus/skip       - Jump to the next phase");
    info!("  PUT  /focus/preset     - Set work/break minutes");
    info!("  PUT  /focus/auto-start - Auto-start the next phase");
    info!("  PUT  /focus/phase      - Select WORK or BREAK");
    info!("  GET  /status           - Timer view and server info");
    info!("  GET  /health           - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
