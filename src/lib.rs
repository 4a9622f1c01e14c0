//! Cyber Heaven Focus - a local focus timer daemon
//! 
//! This library provides the focus/break timer state machine, its persisted
//! snapshot shared by every instance on the device, and the HTTP API that
//! exposes the timer's commands and derived view.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use error::FocusError;
pub use state::AppState;
pub use storage::SnapshotStore;
pub use utils::signals::shutdown_signal;
