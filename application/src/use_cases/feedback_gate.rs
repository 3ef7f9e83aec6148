//! Feedback Gate
//!
//! Folds externally authored feedback into the next generation for a
//! stage. Stateless: the same feedback is applied on every run until an
//! external actor edits or removes it, and nothing here ever writes to the
//! store.

use crate::ports::document_store::{DocumentStore, StoreError};
use pipeline_domain::{FeedbackRecord, Stage};
use std::sync::Arc;
use tracing::debug;

pub struct FeedbackGate {
    store: Arc<dyn DocumentStore>,
    /// Per-request feedback that takes precedence over the stored record
    override_text: Option<String>,
}

impl FeedbackGate {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            override_text: None,
        }
    }

    pub fn with_override(mut self, text: Option<String>) -> Self {
        self.override_text = text.filter(|t| !t.trim().is_empty());
        self
    }

    /// Current feedback for `stage`, re-read on every call
    pub async fn record(&self, stage: Stage) -> Result<FeedbackRecord, StoreError> {
        if let Some(text) = &self.override_text {
            debug!(stage = %stage, "Using request feedback override");
            return Ok(FeedbackRecord::new(stage, Some(text.clone())));
        }

        let stored = self.store.read_feedback(stage).await?;
        Ok(FeedbackRecord::new(stage, stored))
    }

    /// Context block to place ahead of the prompt, or `None` when there is no feedback
    pub async fn maybe_incorporate(&self, stage: Stage) -> Result<Option<String>, StoreError> {
        let record = self.record(stage).await?;
        if record.is_present() {
            debug!(stage = %stage, "Incorporating human feedback");
        }
        Ok(record.context_block())
    }
}
