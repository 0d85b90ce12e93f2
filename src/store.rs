//! JSON snapshot persistence
//!
//! The engine checkpoints the full task set after every successful
//! transition. A snapshot holds everything but the end boundary of a
//! currently open session, which by design dies with the process; recovery
//! of that boundary happens in `TaskTimer::recover_from_restart`.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::state::TaskRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Snapshot file holding every task record, rewritten atomically on each
/// save (write to a temp file in the same directory, then rename).
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load all task records; a missing file is an empty task set.
    pub fn load(&self) -> Result<Vec<TaskRecord>, StoreError> {
        if !self.path.exists() {
            info!("No snapshot at {}, starting with an empty task set", self.path.display());
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        let records: Vec<TaskRecord> = serde_json::from_str(&raw)?;
        info!("Loaded {} tasks from {}", records.len(), self.path.display());
        Ok(records)
    }

    /// Persist the full task set.
    pub fn save(&self, records: &[TaskRecord]) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &encoded)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Snapshot of {} tasks written to {}", records.len(), self.path.display());
        Ok(())
    }
}
