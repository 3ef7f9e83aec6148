//! Request and response bodies of the HTTP API

use chrono::{DateTime, Utc};
use pipeline_application::{DocumentEntry, ExecuteRequest};
use pipeline_domain::{PersonaSelection, ProviderOverride, Role, Stage, Task, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Run settings supplied with an execute request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfigDto {
    pub vision: Option<String>,
    pub output_dir: Option<String>,
    /// Per-role provider/model selection
    pub llm: HashMap<Role, ProviderOverride>,
    /// Credential values keyed by reference (e.g. `GEMINI_API_KEY`)
    pub credentials: HashMap<String, String>,
    /// Persona file name per role
    pub personas: PersonaSelection,
    pub question_count: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteRequestDto {
    #[serde(default)]
    pub config: PipelineConfigDto,
    /// "requirements" (or "brd"), "design" or "tickets"
    pub step: String,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl ExecuteRequestDto {
    pub fn into_request(self, stage: Stage) -> ExecuteRequest {
        let config = self.config;
        let mut request = ExecuteRequest::new(stage);
        request.vision = config.vision.filter(|v| !v.trim().is_empty());
        request.output_dir = config.output_dir.filter(|d| !d.trim().is_empty());
        request.overrides = config.llm;
        request.credentials = config.credentials;
        request.personas = config.personas;
        request.feedback = self.feedback;
        request.question_count = config.question_count.filter(|n| *n > 0);
        request
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub message: String,
}

/// Task snapshot as returned by the status endpoints
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub step: Stage,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Task> for TaskStatusResponse {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id().to_string(),
            status: task.status(),
            step: task.stage(),
            progress: task.progress(),
            message: task.message().to_string(),
            result: task.result().cloned(),
            error: task.error().map(str::to_string),
            created_at: task.created_at(),
            started_at: task.started_at(),
            completed_at: task.completed_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskStatusResponse>,
}

/// `?output_dir=` on the document endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputDirQuery {
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentListResponse {
    pub output_dir: String,
    pub documents: Vec<DocumentEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub step: Stage,
    pub name: &'static str,
    pub content: serde_json::Value,
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResponse {
    pub step: Stage,
    pub session: String,
    pub content: String,
    pub output_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequestDto {
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackResponse {
    pub step: Stage,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub tasks: usize,
}
