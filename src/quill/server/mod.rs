// SPDX-License-Identifier: MIT

//! HTTP surface for starting, inspecting and resuming sessions

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::adk::error::{ModelError, QuillError, WorkflowError};
use crate::quill::workflow::{BlogWorkflow, Decision, HumanInput};

type AppState = Arc<BlogWorkflow>;

pub async fn serve(
    workflow: Arc<BlogWorkflow>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(workflow)).await?;

    Ok(())
}

pub fn router(workflow: Arc<BlogWorkflow>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route(
            "/api/sessions/{id}",
            get(get_session).delete(cancel_session),
        )
        .route("/api/sessions/{id}/resume", post(resume_session))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(workflow)
}

/// Error body `{"error": ...}` with a status derived from the error kind
struct ApiError(QuillError);

impl From<QuillError> for ApiError {
    fn from(err: QuillError) -> Self {
        Self(err)
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        Self(err.into())
    }
}

fn status_for(err: &QuillError) -> StatusCode {
    match err {
        QuillError::Workflow(WorkflowError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
        QuillError::Workflow(
            WorkflowError::SessionExists(_) | WorkflowError::NotSuspended { .. },
        ) => StatusCode::CONFLICT,
        QuillError::Workflow(_) => StatusCode::BAD_REQUEST,
        QuillError::MaxIterations { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        QuillError::Model(ModelError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
        QuillError::Api { .. } | QuillError::Model(_) | QuillError::Http(_) | QuillError::Auth(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            log::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_sessions(State(workflow): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sessions = workflow.sessions().await?;
    Ok(Json(json!({ "sessions": sessions })))
}

#[derive(Deserialize)]
struct CreateSessionRequest {
    topic: String,
    #[serde(default)]
    session_id: Option<String>,
}

async fn create_session(
    State(workflow): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Response, ApiError> {
    if payload.topic.trim().is_empty() {
        let body = Json(json!({ "error": "topic must not be empty" }));
        return Ok((StatusCode::BAD_REQUEST, body).into_response());
    }

    let outcome = match payload.session_id {
        Some(id) => workflow.start_session(&id, payload.topic).await?,
        None => workflow.start(payload.topic).await?,
    };
    Ok((StatusCode::CREATED, Json(outcome)).into_response())
}

async fn get_session(
    State(workflow): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let checkpoint = workflow
        .status(&id)
        .await?
        .ok_or(WorkflowError::SessionNotFound(id))?;
    Ok(Json(json!(checkpoint)))
}

#[derive(Deserialize)]
struct ResumeRequest {
    decision: String,
    #[serde(default)]
    feedback: Option<String>,
}

async fn resume_session(
    State(workflow): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ResumeRequest>,
) -> Result<Json<Value>, ApiError> {
    let decision: Decision = payload.decision.parse()?;
    let input = HumanInput {
        decision,
        feedback: payload.feedback,
    };
    let outcome = workflow.resume(&id, input).await?;
    Ok(Json(json!(outcome)))
}

async fn cancel_session(
    State(workflow): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if workflow.cancel(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(WorkflowError::SessionNotFound(id).into())
    }
}
