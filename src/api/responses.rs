//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{
    timer::whole_seconds_between, Checkpoint, Session, TaskStatus, TaskView, TimerStatus,
    TransitionOutcome,
};

/// Body for task creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Response for the four timer commands: a human-readable outcome plus the
/// authoritative checkpoint the caller's mirror must snap to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerResponse {
    pub message: String,
    pub status: TimerStatus,
    pub active_timer: Option<DateTime<Utc>>,
    pub total_time_spent: u64,
    pub running: bool,
    pub paused: bool,
    pub task_status: TaskStatus,
}

impl TimerResponse {
    pub fn from_outcome(outcome: &TransitionOutcome) -> Self {
        Self {
            message: outcome.message.to_string(),
            status: outcome.checkpoint.status,
            active_timer: outcome.checkpoint.active_timer,
            total_time_spent: outcome.checkpoint.total_time_spent,
            running: outcome.checkpoint.running(),
            paused: outcome.checkpoint.paused(),
            task_status: outcome.task_status,
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            status: self.status,
            active_timer: self.active_timer,
            total_time_spent: self.total_time_spent,
        }
    }
}

/// One task in the bulk listing, carrying everything a client needs to
/// seed its mirror.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub timer_status: TimerStatus,
    pub active_timer: Option<DateTime<Utc>>,
    pub total_time_spent: u64,
    pub running: bool,
    pub paused: bool,
}

impl TaskEntry {
    pub fn from_view(view: &TaskView) -> Self {
        Self {
            id: view.id.clone(),
            title: view.title.clone(),
            description: view.description.clone(),
            status: view.status,
            created_at: view.created_at,
            timer_status: view.checkpoint.status,
            active_timer: view.checkpoint.active_timer,
            total_time_spent: view.checkpoint.total_time_spent,
            running: view.checkpoint.running(),
            paused: view.checkpoint.paused(),
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            status: self.timer_status,
            active_timer: self.active_timer,
            total_time_spent: self.total_time_spent,
        }
    }
}

/// One ledger entry in the reporting view. An open session has no end time
/// and is reported as ongoing, with its duration measured against `now`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    pub ongoing: bool,
}

impl SessionEntry {
    pub fn from_session(session: &Session, now: DateTime<Utc>) -> Self {
        match session.duration_seconds() {
            Some(duration) => Self {
                start_time: session.start_time,
                end_time: session.end_time,
                duration_seconds: duration,
                ongoing: false,
            },
            None => Self {
                start_time: session.start_time,
                end_time: None,
                duration_seconds: whole_seconds_between(session.start_time, now),
                ongoing: true,
            },
        }
    }
}

/// Session ledger report for one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsResponse {
    pub task_id: String,
    pub total_time_spent: u64,
    pub sessions: Vec<SessionEntry>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime: String,
}

impl HealthResponse {
    pub fn ok(uptime: String) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime,
        }
    }
}
