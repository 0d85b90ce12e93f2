//! Main application state management

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Instant,
};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::auth::AccessPolicy;
use crate::store::{SnapshotStore, StoreError};

use super::task::{TaskRecord, TaskStatus};
use super::timer::{Checkpoint, Session, TimerAction, TimerError};

/// Failures surfaced by state operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Task not found")]
    TaskNotFound,

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("state lock poisoned")]
    Poisoned,
}

/// Read model for the bulk listing used by clients to seed their mirrors.
#[derive(Debug, Clone)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub checkpoint: Checkpoint,
}

/// Result of one applied transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub message: &'static str,
    pub checkpoint: Checkpoint,
    pub task_status: TaskStatus,
}

/// Main application state: the task registry and its persistence.
///
/// The outer lock guards only the map. Every task carries its own lock, so
/// transitions against different tasks run fully in parallel while
/// transitions against one task serialize into atomic read-modify-writes.
/// No task lock is ever taken while another task's lock is held.
pub struct AppState {
    tasks: Mutex<HashMap<String, Arc<Mutex<TaskRecord>>>>,
    /// Snapshot persistence; `None` keeps everything in memory.
    store: Option<SnapshotStore>,
    /// Serializes snapshot writes. Held across collect-and-save so a save
    /// that starts after a committed transition always includes it, and
    /// two saves can never interleave their temp-file writes.
    persist_lock: Mutex<()>,
    policy: Arc<dyn AccessPolicy>,
    pub start_time: Instant,
}

impl AppState {
    /// Create an in-memory AppState with no persistence.
    pub fn new(policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            store: None,
            persist_lock: Mutex::new(()),
            policy,
            start_time: Instant::now(),
        }
    }

    /// Create an AppState backed by a snapshot store, loading whatever the
    /// previous process checkpointed. Timers that died with an open session
    /// come back paused with their committed totals intact.
    pub fn with_store(store: SnapshotStore, policy: Arc<dyn AccessPolicy>) -> Result<Self, StateError> {
        let mut records = store.load()?;
        let mut tasks = HashMap::with_capacity(records.len());
        for record in records.iter_mut() {
            record.timer.recover_from_restart();
            tasks.insert(record.id.clone(), Arc::new(Mutex::new(record.clone())));
        }

        Ok(Self {
            tasks: Mutex::new(tasks),
            store: Some(store),
            persist_lock: Mutex::new(()),
            policy,
            start_time: Instant::now(),
        })
    }

    pub fn policy(&self) -> &dyn AccessPolicy {
        self.policy.as_ref()
    }

    /// Create a task with an idle timer and persist the new task set.
    pub fn create_task(&self, title: String, description: String) -> Result<TaskView, StateError> {
        let record = TaskRecord::new(title, description);
        let view = view_of(&record);

        {
            let mut tasks = self.tasks.lock().map_err(|_| StateError::Poisoned)?;
            tasks.insert(record.id.clone(), Arc::new(Mutex::new(record)));
        }
        self.persist()?;

        info!("Task {} created: {}", view.id, view.title);
        Ok(view)
    }

    /// Bulk read: every task with its current timer checkpoint, newest
    /// first. This is the seed/refresh call for client mirrors.
    pub fn list_tasks(&self) -> Result<Vec<TaskView>, StateError> {
        let entries: Vec<Arc<Mutex<TaskRecord>>> = {
            let tasks = self.tasks.lock().map_err(|_| StateError::Poisoned)?;
            tasks.values().cloned().collect()
        };

        let mut views = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = entry.lock().map_err(|_| StateError::Poisoned)?;
            views.push(view_of(&record));
        }
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(views)
    }

    /// Apply one timer transition as a single atomic read-modify-write
    /// under the task's own lock, then checkpoint the task set to disk.
    pub fn apply(
        &self,
        task_id: &str,
        action: TimerAction,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, StateError> {
        let entry = self.entry(task_id)?;

        let outcome = {
            let mut record = entry.lock().map_err(|_| StateError::Poisoned)?;
            let (message, checkpoint) = match action {
                TimerAction::Start => {
                    let message = if record.timer.status().is_running() {
                        "Timer already running"
                    } else {
                        "Timer started"
                    };
                    (message, record.timer.start(now))
                }
                TimerAction::Pause => ("Timer paused", record.timer.pause(now)?),
                TimerAction::Resume => ("Timer resumed", record.timer.resume(now)?),
                TimerAction::Stop => {
                    let checkpoint = record.timer.stop(now)?;
                    // Stopping the timer also finishes the work item
                    record.mark_completed();
                    ("Timer stopped", checkpoint)
                }
            };
            TransitionOutcome {
                message,
                checkpoint,
                task_status: record.status,
            }
        };

        self.persist()?;
        info!("Task {}: {}", task_id, outcome.message);
        Ok(outcome)
    }

    /// Session ledger for the reporting view, with the current checkpoint
    /// so an open entry can be rendered against a live clock.
    pub fn sessions(&self, task_id: &str) -> Result<(Checkpoint, Vec<Session>), StateError> {
        let entry = self.entry(task_id)?;
        let record = entry.lock().map_err(|_| StateError::Poisoned)?;
        Ok((record.timer.checkpoint(), record.timer.sessions().to_vec()))
    }

    /// Calculate server uptime as a formatted string.
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    fn entry(&self, task_id: &str) -> Result<Arc<Mutex<TaskRecord>>, StateError> {
        let tasks = self.tasks.lock().map_err(|_| StateError::Poisoned)?;
        tasks.get(task_id).cloned().ok_or(StateError::TaskNotFound)
    }

    fn persist(&self) -> Result<(), StateError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().map_err(|_| StateError::Poisoned)?;

        let entries: Vec<Arc<Mutex<TaskRecord>>> = {
            let tasks = self.tasks.lock().map_err(|_| StateError::Poisoned)?;
            tasks.values().cloned().collect()
        };
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            records.push(entry.lock().map_err(|_| StateError::Poisoned)?.clone());
        }

        store.save(&records)?;
        Ok(())
    }
}

fn view_of(record: &TaskRecord) -> TaskView {
    TaskView {
        id: record.id.clone(),
        title: record.title.clone(),
        description: record.description.clone(),
        status: record.status,
        created_at: record.created_at,
        checkpoint: record.timer.checkpoint(),
    }
}
