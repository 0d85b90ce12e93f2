//! HTTP error taxonomy
//!
//! Invalid transitions are caller errors (400) with the specific guard
//! message; authorization failures are 401 so clients can redirect to
//! re-authentication instead of showing a timer message; unknown tasks are
//! 404; anything else is a 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::state::{StateError, TimerError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Task not found")]
    TaskNotFound,

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal server error")]
    Internal,
}

impl From<StateError> for ApiError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::TaskNotFound => ApiError::TaskNotFound,
            StateError::Timer(e) => ApiError::Timer(e),
            StateError::Store(e) => {
                tracing::error!("Snapshot persistence failed: {}", e);
                ApiError::Internal
            }
            StateError::Poisoned => {
                tracing::error!("State lock poisoned");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::TaskNotFound => StatusCode::NOT_FOUND,
            ApiError::Timer(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
