//! Task record owned by the server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::timer::TaskTimer;

/// Work-item status on the owning task. Distinct from the timer's status;
/// stopping the timer marks the task completed as a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

/// A tracked task and its timer. The timer is created with the task and
/// destroyed with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub timer: TaskTimer,
}

impl TaskRecord {
    pub fn new(title: String, description: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            timer: TaskTimer::new(),
        }
    }

    pub fn mark_completed(&mut self) {
        self.status = TaskStatus::Completed;
    }
}
