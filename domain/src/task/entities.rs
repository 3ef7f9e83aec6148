//! Task entity and its state machine.

use super::error::TransitionError;
use super::events::{ProgressEvent, ProgressEventKind, TaskEvent};
use crate::core::error::DomainError;
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Unique task identifier (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidTaskId(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// `completed` and `failed` are terminal: no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One asynchronous execution of a pipeline stage (Entity)
///
/// Fields are read-only from the outside; the only way to change a task is
/// [`Task::apply`], which enforces the lifecycle and keeps `progress`
/// non-decreasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    stage: Stage,
    status: TaskStatus,
    progress: u8,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Progress reported as soon as a task starts running
    pub const STARTED_PROGRESS: u8 = 10;
    /// Highest progress a running task can report; 100 means completed
    pub const MAX_RUNNING_PROGRESS: u8 = 99;

    /// Create a new pending task
    pub fn new(stage: Stage) -> Self {
        Self::with_id(TaskId::generate(), stage)
    }

    pub fn with_id(id: TaskId, stage: Stage) -> Self {
        Self {
            id,
            stage,
            status: TaskStatus::Pending,
            progress: 0,
            message: format!("Stage '{}' queued for execution", stage),
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn result(&self) -> Option<&serde_json::Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a lifecycle event.
    ///
    /// Returns the event to publish on success. On error the task is not
    /// modified.
    pub fn apply(&mut self, event: TaskEvent) -> Result<ProgressEvent, TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::AlreadyTerminal {
                id: self.id.clone(),
                status: self.status,
            });
        }

        match (self.status, event) {
            (TaskStatus::Pending, TaskEvent::Start { message }) => {
                self.status = TaskStatus::Running;
                self.progress = self.progress.max(Self::STARTED_PROGRESS);
                self.message = message;
                self.started_at = Some(Utc::now());
                Ok(self.to_event(ProgressEventKind::Progress))
            }
            (TaskStatus::Running, TaskEvent::Start { .. }) => Err(TransitionError::AlreadyStarted {
                id: self.id.clone(),
            }),
            (TaskStatus::Running, TaskEvent::Progress { percent, message }) => {
                let capped = percent.min(Self::MAX_RUNNING_PROGRESS);
                self.progress = self.progress.max(capped);
                self.message = message;
                Ok(self.to_event(ProgressEventKind::Progress))
            }
            (TaskStatus::Running, TaskEvent::Complete { message, result }) => {
                self.status = TaskStatus::Completed;
                self.progress = 100;
                self.message = message;
                self.result = Some(result);
                self.completed_at = Some(Utc::now());
                Ok(self.to_event(ProgressEventKind::Complete))
            }
            (TaskStatus::Running, TaskEvent::Fail { error }) => {
                self.status = TaskStatus::Failed;
                self.message = format!("Stage '{}' failed", self.stage);
                self.error = Some(error);
                self.completed_at = Some(Utc::now());
                Ok(self.to_event(ProgressEventKind::Error))
            }
            _ => Err(TransitionError::NotStarted {
                id: self.id.clone(),
            }),
        }
    }

    /// Event carrying the current snapshot, sent to a subscriber on connect
    pub fn snapshot_event(&self) -> ProgressEvent {
        self.to_event(ProgressEventKind::Ack)
    }

    /// The terminal event for a finished task, if it has finished
    pub fn terminal_event(&self) -> Option<ProgressEvent> {
        match self.status {
            TaskStatus::Completed => Some(self.to_event(ProgressEventKind::Complete)),
            TaskStatus::Failed => Some(self.to_event(ProgressEventKind::Error)),
            _ => None,
        }
    }

    fn to_event(&self, kind: ProgressEventKind) -> ProgressEvent {
        ProgressEvent {
            kind,
            task_id: self.id.clone(),
            stage: self.stage,
            status: self.status,
            progress: self.progress,
            message: self.message.clone(),
            result: match kind {
                ProgressEventKind::Complete | ProgressEventKind::Ack => self.result.clone(),
                _ => None,
            },
            error: self.error.clone(),
            timestamp: Utc::now(),
        }
    }
}
