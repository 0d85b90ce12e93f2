//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use tracing::info;

use crate::state::{AppState, TimerAction};

use super::error::ApiError;
use super::responses::{
    CreateTaskRequest, HealthResponse, SessionEntry, SessionsResponse, TaskEntry, TimerResponse,
};

/// Handle POST /tasks - create a task with an idle timer
pub async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskEntry>), ApiError> {
    let view = state.create_task(body.title, body.description)?;
    Ok((StatusCode::CREATED, Json(TaskEntry::from_view(&view))))
}

/// Handle GET /tasks - bulk read of every task with its timer checkpoint,
/// the seed and refresh call for client mirrors
pub async fn list_tasks_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TaskEntry>>, ApiError> {
    let views = state.list_tasks()?;
    Ok(Json(views.iter().map(TaskEntry::from_view).collect()))
}

/// Handle PUT /tasks/:id/starttime
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TimerResponse>, ApiError> {
    transition(&state, &id, TimerAction::Start)
}

/// Handle PUT /tasks/:id/pausetime
pub async fn pause_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TimerResponse>, ApiError> {
    transition(&state, &id, TimerAction::Pause)
}

/// Handle PUT /tasks/:id/resumetime
pub async fn resume_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TimerResponse>, ApiError> {
    transition(&state, &id, TimerAction::Resume)
}

/// Handle PUT /tasks/:id/stoptime - also marks the owning task completed
pub async fn stop_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TimerResponse>, ApiError> {
    transition(&state, &id, TimerAction::Stop)
}

/// Handle GET /tasks/:id/sessions - the reporting view of the ledger
pub async fn sessions_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let (checkpoint, sessions) = state.sessions(&id)?;
    let now = Utc::now();
    Ok(Json(SessionsResponse {
        task_id: id,
        total_time_spent: checkpoint.total_time_spent,
        sessions: sessions
            .iter()
            .map(|s| SessionEntry::from_session(s, now))
            .collect(),
    }))
}

/// Handle GET /health - health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(state.get_uptime()))
}

fn transition(
    state: &AppState,
    id: &str,
    action: TimerAction,
) -> Result<Json<TimerResponse>, ApiError> {
    let outcome = state.apply(id, action, Utc::now())?;
    info!("Timer action on task {}: {}", id, outcome.message);
    Ok(Json(TimerResponse::from_outcome(&outcome)))
}
