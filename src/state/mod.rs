//! State management module
//! 
//! This module contains the focus timer state, its state machine, the derived
//! view, and the application-scoped service object that ties them together.

pub mod app_state;
pub mod derived;
pub mod engine;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, CommandOutcome};
pub use derived::DerivedView;
pub use engine::{FocusEngine, PhaseAdvance};
pub use timer_state::{ActivePhase, Phase, TimerState};
