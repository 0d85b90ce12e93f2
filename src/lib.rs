//! taskclock - A state-managed HTTP server for per-task time tracking
//!
//! The server side owns one timer state machine per task with a durable
//! session ledger; the client side mirrors those timers as smoothly
//! advancing counters that reconcile against the server's checkpoints.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod state;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::AppState;
pub use store::SnapshotStore;
pub use utils::shutdown_signal;
