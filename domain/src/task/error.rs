//! Task transition errors

use super::entities::{TaskId, TaskStatus};
use thiserror::Error;

/// Rejected task transition. The task is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("task {id} is already {status} and accepts no further transitions")]
    AlreadyTerminal { id: TaskId, status: TaskStatus },

    #[error("task {id} has already started")]
    AlreadyStarted { id: TaskId },

    #[error("task {id} has not started yet")]
    NotStarted { id: TaskId },

    #[error("task {0} not found")]
    NotFound(TaskId),
}

impl TransitionError {
    /// Check if the rejection was caused by the task already being finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransitionError::AlreadyTerminal { .. })
    }
}
