//! Axum route handlers for the Interview API.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::controller::InterviewController;
use crate::interview::models::InterviewSnapshot;
use crate::state::AppState;

/// Longest answer accepted from the presentation layer.
const MAX_ANSWER_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

async fn find(state: &AppState, id: Uuid) -> Result<Arc<InterviewController>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))
}

/// POST /api/v1/interviews
///
/// Creates a session and issues the first request. A failed first request
/// still creates the session; the snapshot comes back in the `error` phase.
pub async fn handle_create_interview(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<InterviewSnapshot>), AppError> {
    let controller = state.sessions.create().await;
    controller.start().await?;
    info!(
        "Interview {} opened in phase {}",
        controller.id(),
        controller.phase().await
    );
    Ok((StatusCode::CREATED, Json(controller.snapshot().await)))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewSnapshot>, AppError> {
    let controller = find(&state, id).await?;
    Ok(Json(controller.snapshot().await))
}

/// POST /api/v1/interviews/:id/start
///
/// Starts an idle session again, typically after a reset.
pub async fn handle_start(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewSnapshot>, AppError> {
    let controller = find(&state, id).await?;
    controller.start().await?;
    Ok(Json(controller.snapshot().await))
}

/// POST /api/v1/interviews/:id/answers
///
/// Blank answers are accepted and ignored; the unchanged snapshot is returned.
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<InterviewSnapshot>, AppError> {
    if request.answer.chars().count() > MAX_ANSWER_CHARS {
        return Err(AppError::Validation(format!(
            "answer cannot exceed {MAX_ANSWER_CHARS} characters"
        )));
    }

    let controller = find(&state, id).await?;
    controller.submit_answer(&request.answer).await?;
    Ok(Json(controller.snapshot().await))
}

/// POST /api/v1/interviews/:id/retry
pub async fn handle_retry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewSnapshot>, AppError> {
    let controller = find(&state, id).await?;
    controller.retry_last().await?;
    Ok(Json(controller.snapshot().await))
}

/// POST /api/v1/interviews/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewSnapshot>, AppError> {
    let controller = find(&state, id).await?;
    controller.reset().await;
    Ok(Json(controller.snapshot().await))
}

/// DELETE /api/v1/interviews/:id
pub async fn handle_delete_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Interview {id} not found")))
    }
}
