//! Human feedback attached to a stage.
//!
//! Feedback is read-only to the pipeline: it is re-read on every run and
//! stays in place until an external actor changes or removes it.

use crate::stage::Stage;
use serde::{Deserialize, Serialize};

/// Heading that marks the feedback block inside a prompt
pub const FEEDBACK_HEADING: &str = "## Human Feedback (apply these changes)";

/// Feedback for one stage (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    stage: Stage,
    text: Option<String>,
}

impl FeedbackRecord {
    /// Blank text is treated as absent
    pub fn new(stage: Stage, text: Option<String>) -> Self {
        let text = text.filter(|t| !t.trim().is_empty());
        Self { stage, text }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.text.is_some()
    }

    /// Prompt block placed ahead of the standard prompt; `None` when absent
    pub fn context_block(&self) -> Option<String> {
        self.text
            .as_ref()
            .map(|text| format!("{}\n\n{}\n", FEEDBACK_HEADING, text.trim_end()))
    }
}
