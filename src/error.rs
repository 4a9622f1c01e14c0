//! Error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FocusError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to lock {0}")]
    LockPoisoned(&'static str),
}
