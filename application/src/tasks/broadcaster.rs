//! Progress Broadcaster
//!
//! One `tokio::sync::broadcast` channel per task. Publishing with no
//! subscribers drops the event; the task snapshot remains the source of
//! truth. The channel is dropped after the terminal event, which ends
//! every subscriber's stream once it has drained.

use pipeline_domain::{ProgressEvent, TaskId};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::debug;

/// Default per-task buffer before slow subscribers start lagging
pub const DEFAULT_CAPACITY: usize = 64;

pub struct ProgressBroadcaster {
    channels: Mutex<HashMap<TaskId, broadcast::Sender<ProgressEvent>>>,
    capacity: usize,
}

impl Default for ProgressBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Open the channel for a new task
    pub fn open(&self, id: &TaskId) {
        let (sender, _) = broadcast::channel(self.capacity);
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), sender);
    }

    /// Subscribe to future events; `None` once the task's channel is closed
    pub fn subscribe(&self, id: &TaskId) -> Option<ProgressSubscription> {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|sender| ProgressSubscription {
                receiver: sender.subscribe(),
            })
    }

    /// Deliver to every current subscriber, closing the channel after a terminal event
    pub fn publish(&self, id: &TaskId, event: ProgressEvent) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let terminal = event.is_terminal();

        if let Some(sender) = channels.get(id) {
            // Err only means nobody is listening right now
            let delivered = sender.send(event).unwrap_or(0);
            debug!(task_id = %id, delivered, "Published progress event");
        }

        if terminal {
            channels.remove(id);
        }
    }

    pub fn subscriber_count(&self, id: &TaskId) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

/// A live feed of one task's events, in emission order
pub struct ProgressSubscription {
    receiver: broadcast::Receiver<ProgressEvent>,
}

impl ProgressSubscription {
    /// Next event; `None` when the channel has closed.
    ///
    /// A subscriber that falls behind skips the deltas it missed.
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Progress subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
