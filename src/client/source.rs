//! Checkpoint transport
//!
//! The reconciler talks to the engine through `CheckpointSource`, so tests
//! drive it with an in-memory double and production uses HTTP.

use std::future::Future;

use thiserror::Error;

use crate::api::responses::{TaskEntry, TimerResponse};
use crate::state::{Checkpoint, TimerAction};

#[derive(Debug, Error)]
pub enum SourceError {
    /// The request never produced a server answer; the mirror keeps its
    /// last known values.
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered but refused the action (guard rejection,
    /// unknown task).
    #[error("server rejected the action: {0}")]
    Rejected(String),

    /// Token rejected; the caller should re-authenticate.
    #[error("not authorized")]
    Unauthorized,
}

/// Where checkpoints come from and where commands go.
pub trait CheckpointSource {
    /// Bulk read of every visible task's checkpoint, used for seeding and
    /// periodic refresh.
    fn fetch(&self) -> impl Future<Output = Result<Vec<(String, Checkpoint)>, SourceError>> + Send;

    /// Send one timer command; a successful answer carries the
    /// authoritative checkpoint to snap to.
    fn command(
        &self,
        task_id: &str,
        action: TimerAction,
    ) -> impl Future<Output = Result<Checkpoint, SourceError>> + Send;
}

fn route_segment(action: TimerAction) -> &'static str {
    match action {
        TimerAction::Start => "starttime",
        TimerAction::Pause => "pausetime",
        TimerAction::Resume => "resumetime",
        TimerAction::Stop => "stoptime",
    }
}

/// HTTP checkpoint source against the server's task routes.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    async fn rejection_message(response: reqwest::Response) -> String {
        let status = response.status();
        response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| format!("HTTP {status}"))
    }
}

impl CheckpointSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<(String, Checkpoint)>, SourceError> {
        let response = self
            .client
            .get(format!("{}/tasks", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SourceError::Unauthorized);
        }
        if !response.status().is_success() {
            return Err(SourceError::Rejected(Self::rejection_message(response).await));
        }

        let entries: Vec<TaskEntry> = response
            .json()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.id.clone(), entry.checkpoint()))
            .collect())
    }

    async fn command(
        &self,
        task_id: &str,
        action: TimerAction,
    ) -> Result<Checkpoint, SourceError> {
        let url = format!(
            "{}/tasks/{}/{}",
            self.base_url,
            task_id,
            route_segment(action)
        );
        let response = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SourceError::Unauthorized);
        }
        if !response.status().is_success() {
            return Err(SourceError::Rejected(Self::rejection_message(response).await));
        }

        let body: TimerResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        Ok(body.checkpoint())
    }
}
