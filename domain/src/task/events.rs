//! Task lifecycle events and the progress messages derived from them.

use super::entities::{TaskId, TaskStatus};
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input to [`Task::apply`](super::entities::Task::apply)
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// `pending → running`
    Start { message: String },
    /// Intermediate progress while running
    Progress { percent: u8, message: String },
    /// `running → completed`
    Complete {
        message: String,
        result: serde_json::Value,
    },
    /// `running → failed`
    Fail { error: String },
}

impl TaskEvent {
    pub fn start(message: impl Into<String>) -> Self {
        TaskEvent::Start {
            message: message.into(),
        }
    }

    pub fn progress(percent: u8, message: impl Into<String>) -> Self {
        TaskEvent::Progress {
            percent,
            message: message.into(),
        }
    }

    pub fn complete(message: impl Into<String>, result: serde_json::Value) -> Self {
        TaskEvent::Complete {
            message: message.into(),
            result,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        TaskEvent::Fail {
            error: error.into(),
        }
    }
}

/// Kind of push-update delivered to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventKind {
    /// Task started or reported intermediate progress
    Progress,
    /// Task completed successfully
    Complete,
    /// Task failed
    Error,
    /// Current snapshot, sent once when an observer subscribes
    Ack,
}

/// Ephemeral state-change notification for one task
///
/// Not persisted: the task snapshot is the source of truth, these only
/// carry deltas to live observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: ProgressEventKind,
    pub task_id: TaskId,
    pub stage: Stage,
    pub status: TaskStatus,
    pub progress: u8,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// True for `complete` / `error`: no more events follow
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            ProgressEventKind::Complete | ProgressEventKind::Error
        )
    }
}
