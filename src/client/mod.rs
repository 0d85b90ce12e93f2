//! Client-side timer mirroring
//!
//! Everything here is non-authoritative: a viewer's best-effort copy of
//! the engine's checkpoints, advanced locally between round trips and
//! reconciled back to the server's answer whenever one arrives.

pub mod mirror;
pub mod reconciler;
pub mod source;

// Re-export main types
pub use mirror::{MirrorSet, TaskMirror};
pub use reconciler::{Reconciler, ReconcilerConfig};
pub use source::{CheckpointSource, HttpSource, SourceError};
