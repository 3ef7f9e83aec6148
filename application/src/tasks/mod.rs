//! Task lifecycle and progress fan-out.

pub mod broadcaster;
pub mod manager;

use crate::ports::progress::ProgressNotifier;
use pipeline_domain::{TaskEvent, TaskId};
use std::sync::Arc;
use tracing::debug;

pub use broadcaster::{ProgressBroadcaster, ProgressSubscription};
pub use manager::{TaskManager, TaskWatch};

/// Routes use case milestones into `Progress` transitions for one task
pub struct TaskProgress {
    manager: Arc<TaskManager>,
    id: TaskId,
}

impl TaskProgress {
    pub fn new(manager: Arc<TaskManager>, id: TaskId) -> Self {
        Self { manager, id }
    }
}

impl ProgressNotifier for TaskProgress {
    fn on_progress(&self, percent: u8, message: &str) {
        if let Err(e) = self
            .manager
            .transition(&self.id, TaskEvent::progress(percent, message))
        {
            debug!(task_id = %self.id, "Progress update ignored: {}", e);
        }
    }
}
