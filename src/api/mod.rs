//! HTTP API module
//!
//! This module contains the router, the authorization middleware, endpoint
//! handlers and response structures.

pub mod error;
pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use error::ApiError;
use handlers::*;

/// Create the HTTP router with all endpoints. Every task route sits behind
/// the access policy; only the health probe is open.
pub fn create_router(state: Arc<AppState>) -> Router {
    let guarded = Router::new()
        .route("/tasks", post(create_task_handler).get(list_tasks_handler))
        .route("/tasks/:id/starttime", put(start_timer_handler))
        .route("/tasks/:id/pausetime", put(pause_timer_handler))
        .route("/tasks/:id/resumetime", put(resume_timer_handler))
        .route("/tasks/:id/stoptime", put(stop_timer_handler))
        .route("/tasks/:id/sessions", get(sessions_handler))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_auth,
        ));

    Router::new()
        .merge(guarded)
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject unauthenticated callers before any handler touches state.
async fn require_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.policy().authorize(bearer_token(&request))?;
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenPolicy;
    use axum::body::Body;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const TOKEN: &str = "test-token";

    fn app() -> Router {
        let policy = Arc::new(TokenPolicy::new([TOKEN.to_string()]));
        create_router(Arc::new(AppState::new(policy)))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(value) => builder
                .header("content-type", "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_task(app: &Router) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/tasks",
            Some(TOKEN),
            Some(json!({ "title": "write report" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_open() {
        let (status, body) = send(&app(), Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn task_routes_require_a_token() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/tasks", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized, no token");

        let (status, body) = send(&app, Method::GET, "/tasks", Some("wrong"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized, token failed");
    }

    #[tokio::test]
    async fn create_then_list() {
        let app = app();
        let id = create_task(&app).await;

        let (status, body) = send(&app, Method::GET, "/tasks", Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        let tasks = body.as_array().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0]["id"], id);
        assert_eq!(tasks[0]["totalTimeSpent"], 0);
        assert_eq!(tasks[0]["running"], false);
        assert_eq!(tasks[0]["paused"], false);
        assert_eq!(tasks[0]["status"], "pending");
    }

    #[tokio::test]
    async fn start_returns_checkpoint_and_is_idempotent() {
        let app = app();
        let id = create_task(&app).await;
        let uri = format!("/tasks/{id}/starttime");

        let (status, first) = send(&app, Method::PUT, &uri, Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["message"], "Timer started");
        assert_eq!(first["running"], true);
        assert!(first["activeTimer"].is_string());

        let (status, second) = send(&app, Method::PUT, &uri, Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["message"], "Timer already running");
        assert_eq!(second["activeTimer"], first["activeTimer"]);
    }

    #[tokio::test]
    async fn invalid_transitions_are_bad_requests() {
        let app = app();
        let id = create_task(&app).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/tasks/{id}/pausetime"),
            Some(TOKEN),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Timer not running");

        send(
            &app,
            Method::PUT,
            &format!("/tasks/{id}/starttime"),
            Some(TOKEN),
            None,
        )
        .await;
        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/tasks/{id}/resumetime"),
            Some(TOKEN),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Task not paused");
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let (status, body) = send(
            &app(),
            Method::PUT,
            "/tasks/missing/starttime",
            Some(TOKEN),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Task not found");
    }

    #[tokio::test]
    async fn stop_completes_the_task() {
        let app = app();
        let id = create_task(&app).await;

        send(
            &app,
            Method::PUT,
            &format!("/tasks/{id}/starttime"),
            Some(TOKEN),
            None,
        )
        .await;
        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/tasks/{id}/stoptime"),
            Some(TOKEN),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Timer stopped");
        assert_eq!(body["running"], false);
        assert_eq!(body["taskStatus"], "completed");
        assert!(body["activeTimer"].is_null());
    }

    #[tokio::test]
    async fn sessions_report_tolerates_an_open_entry() {
        let app = app();
        let id = create_task(&app).await;

        send(
            &app,
            Method::PUT,
            &format!("/tasks/{id}/starttime"),
            Some(TOKEN),
            None,
        )
        .await;
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/tasks/{id}/sessions"),
            Some(TOKEN),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let sessions = body["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["ongoing"], true);
        assert!(sessions[0]["endTime"].is_null());

        send(
            &app,
            Method::PUT,
            &format!("/tasks/{id}/pausetime"),
            Some(TOKEN),
            None,
        )
        .await;
        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/tasks/{id}/sessions"),
            Some(TOKEN),
            None,
        )
        .await;
        let sessions = body["sessions"].as_array().unwrap();
        assert_eq!(sessions[0]["ongoing"], false);
        assert!(sessions[0]["endTime"].is_string());
    }
}
