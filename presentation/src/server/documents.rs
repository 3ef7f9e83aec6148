//! Generated documents, Q&A transcripts and human feedback

use super::AppState;
use super::dto::{
    DocumentListResponse, DocumentResponse, FeedbackRequestDto, FeedbackResponse,
    MessageResponse, OutputDirQuery, TranscriptResponse,
};
use super::error::{ApiError, ApiResult};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use pipeline_application::DocumentStore;
use pipeline_domain::Stage;
use std::sync::Arc;
use tracing::info;

pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_documents))
        .route("/list", get(list_documents))
        .route("/:step", get(get_document))
        .route("/:step/qa", get(get_transcript))
        .route(
            "/:step/feedback",
            get(get_feedback).post(save_feedback).delete(delete_feedback),
        )
}

/// Store for the requested output directory (the configured default when absent)
fn open_store(state: &AppState, query: &OutputDirQuery) -> (String, Arc<dyn DocumentStore>) {
    let location = query
        .output_dir
        .as_deref()
        .map(str::trim)
        .filter(|dir| !dir.is_empty())
        .unwrap_or(state.service.default_output_dir())
        .to_string();
    let store = state.service.stores().open(&location);
    (location, store)
}

fn parse_step(step: &str) -> ApiResult<Stage> {
    step.parse().map_err(|e| ApiError::BadRequest(format!("{e}")))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<OutputDirQuery>,
) -> ApiResult<Json<DocumentListResponse>> {
    let (output_dir, store) = open_store(&state, &query);
    let documents = store.list().await?;
    Ok(Json(DocumentListResponse {
        output_dir,
        documents,
    }))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(step): Path<String>,
    Query(query): Query<OutputDirQuery>,
) -> ApiResult<Json<DocumentResponse>> {
    let stage = parse_step(&step)?;
    let (output_dir, store) = open_store(&state, &query);
    let document = store.read_document(stage).await?.ok_or_else(|| {
        ApiError::NotFound(format!("{} not found in {}", stage.display_name(), output_dir))
    })?;

    Ok(Json(DocumentResponse {
        step: stage,
        name: stage.display_name(),
        content: document.into_content(),
        output_dir,
    }))
}

pub async fn get_transcript(
    State(state): State<AppState>,
    Path(step): Path<String>,
    Query(query): Query<OutputDirQuery>,
) -> ApiResult<Json<TranscriptResponse>> {
    let stage = parse_step(&step)?;
    let session = stage.session_name().ok_or_else(|| {
        ApiError::BadRequest(format!("the {stage} step has no Q&A session"))
    })?;

    let (output_dir, store) = open_store(&state, &query);
    let content = store
        .read_transcript(session)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Q&A transcript {session} not found")))?;

    Ok(Json(TranscriptResponse {
        step: stage,
        session: session.to_string(),
        content,
        output_dir,
    }))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    Path(step): Path<String>,
    Query(query): Query<OutputDirQuery>,
) -> ApiResult<Json<FeedbackResponse>> {
    let stage = parse_step(&step)?;
    let (_, store) = open_store(&state, &query);
    let feedback = store.read_feedback(stage).await?;
    Ok(Json(FeedbackResponse {
        step: stage,
        exists: feedback.is_some(),
        feedback,
    }))
}

pub async fn save_feedback(
    State(state): State<AppState>,
    Path(step): Path<String>,
    Query(query): Query<OutputDirQuery>,
    Json(body): Json<FeedbackRequestDto>,
) -> ApiResult<Json<MessageResponse>> {
    let stage = parse_step(&step)?;
    let text = body.feedback.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("feedback must not be empty".to_string()));
    }

    let (output_dir, store) = open_store(&state, &query);
    store.write_feedback(stage, text).await?;
    info!(stage = %stage, output_dir = %output_dir, "Feedback saved");

    Ok(Json(MessageResponse {
        message: format!("Feedback saved for {}", stage.display_name()),
    }))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(step): Path<String>,
    Query(query): Query<OutputDirQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let stage = parse_step(&step)?;
    let (_, store) = open_store(&state, &query);
    let removed = store.remove_feedback(stage).await?;
    Ok(Json(serde_json::json!({ "step": stage, "removed": removed })))
}
