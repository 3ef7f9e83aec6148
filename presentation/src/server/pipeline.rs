//! Pipeline execution and task status endpoints

use super::AppState;
use super::dto::{ExecuteRequestDto, ExecuteResponse, TaskListResponse, TaskStatusResponse};
use super::error::{ApiError, ApiResult};
use super::websocket::task_socket;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use pipeline_domain::{Stage, TaskId};
use tracing::info;

pub fn pipeline_routes() -> Router<AppState> {
    Router::new()
        .route("/execute", post(execute))
        .route("/status/:task_id", get(task_status))
        .route("/tasks", get(list_tasks))
        .route("/ws/:task_id", get(task_socket))
}

/// Start a stage in the background and return its task id
pub async fn execute(
    State(state): State<AppState>,
    Json(body): Json<ExecuteRequestDto>,
) -> ApiResult<Json<ExecuteResponse>> {
    let stage: Stage = body
        .step
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let request = body.into_request(stage);
    if stage == Stage::Requirements && request.vision.is_none() {
        return Err(ApiError::BadRequest(
            "vision is required for the requirements step".to_string(),
        ));
    }

    let task = state.service.submit(request);
    info!(task_id = %task.id(), stage = %stage, "Task submitted");

    Ok(Json(ExecuteResponse {
        task_id: task.id().to_string(),
        status: task.status(),
        message: format!("{} started", stage.display_name()),
    }))
}

pub async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskStatusResponse>> {
    let not_found = || ApiError::NotFound(format!("Task {task_id} not found"));
    let id: TaskId = task_id.parse().map_err(|_| not_found())?;
    let task = state.service.tasks().get(&id).ok_or_else(not_found)?;
    Ok(Json(TaskStatusResponse::from(&task)))
}

pub async fn list_tasks(State(state): State<AppState>) -> Json<TaskListResponse> {
    let tasks = state
        .service
        .tasks()
        .list()
        .iter()
        .map(TaskStatusResponse::from)
        .collect();
    Json(TaskListResponse { tasks })
}
