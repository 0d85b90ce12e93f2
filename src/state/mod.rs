//! State management module
//!
//! This module contains all state-related structures and their management logic.

pub mod app_state;
pub mod task;
pub mod timer;

// Re-export main types
pub use app_state::{AppState, StateError, TaskView, TransitionOutcome};
pub use task::{TaskRecord, TaskStatus};
pub use timer::{Checkpoint, Session, TaskTimer, TimerAction, TimerError, TimerStatus};
