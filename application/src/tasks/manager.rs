//! Task Manager
//!
//! The registry of every task this process has created. Created once at
//! process start and shared by reference; there is no ambient global.
//!
//! Each task lives in its own slot behind its own mutex. The outer map lock
//! is only held to insert or look up a slot, so tasks never contend with
//! each other. Events are published while the slot lock is held, and
//! [`TaskManager::watch`] snapshots and subscribes under that same lock, so
//! a watcher cannot miss a delta between the two.

use super::broadcaster::{ProgressBroadcaster, ProgressSubscription};
use pipeline_domain::{ProgressEvent, Stage, Task, TaskEvent, TaskId, TransitionError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Snapshot plus live feed for one observer
pub struct TaskWatch {
    pub snapshot: Task,
    /// `None` when the task had already finished at subscription time
    pub updates: Option<ProgressSubscription>,
}

impl TaskWatch {
    /// First message for a new observer
    pub fn ack(&self) -> ProgressEvent {
        self.snapshot.snapshot_event()
    }
}

pub struct TaskManager {
    tasks: RwLock<HashMap<TaskId, Arc<Mutex<Task>>>>,
    broadcaster: ProgressBroadcaster,
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new(ProgressBroadcaster::default())
    }
}

impl TaskManager {
    pub fn new(broadcaster: ProgressBroadcaster) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            broadcaster,
        }
    }

    /// Register a new pending task
    pub fn create(&self, stage: Stage) -> Task {
        let task = Task::new(stage);
        self.broadcaster.open(task.id());
        self.tasks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(task.id().clone(), Arc::new(Mutex::new(task.clone())));
        info!(task_id = %task.id(), stage = %stage, "Task created");
        task
    }

    /// Apply a lifecycle event and publish the resulting progress event.
    ///
    /// Rejected transitions leave the task unchanged and publish nothing.
    pub fn transition(&self, id: &TaskId, event: TaskEvent) -> Result<Task, TransitionError> {
        let slot = self.slot(id)?;
        let mut task = slot.lock().unwrap_or_else(PoisonError::into_inner);

        match task.apply(event) {
            Ok(progress) => {
                debug!(
                    task_id = %id,
                    status = task.status().as_str(),
                    progress = task.progress(),
                    "Task transition"
                );
                self.broadcaster.publish(id, progress);
                Ok(task.clone())
            }
            Err(e) => {
                warn!(task_id = %id, "Rejected task transition: {}", e);
                Err(e)
            }
        }
    }

    /// Current snapshot, including after termination
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        let slot = self.slot(id).ok()?;
        let task = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Some(task.clone())
    }

    /// All tracked tasks, oldest first
    pub fn list(&self) -> Vec<Task> {
        let slots: Vec<_> = self
            .tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        let mut tasks: Vec<Task> = slots
            .iter()
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .collect();
        tasks.sort_by_key(|t| t.created_at());
        tasks
    }

    /// Snapshot and subscribe atomically with respect to transitions
    pub fn watch(&self, id: &TaskId) -> Result<TaskWatch, TransitionError> {
        let slot = self.slot(id)?;
        let task = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let updates = if task.is_terminal() {
            None
        } else {
            self.broadcaster.subscribe(id)
        };
        Ok(TaskWatch {
            snapshot: task.clone(),
            updates,
        })
    }

    pub fn len(&self) -> usize {
        self.tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: &TaskId) -> Result<Arc<Mutex<Task>>, TransitionError> {
        self.tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| TransitionError::NotFound(id.clone()))
    }
}
