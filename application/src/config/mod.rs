//! Application-level configuration.
//!
//! - [`PipelineSettings`] — question counts, conversation strategy, refinement toggle
//! - [`RetryPolicy`] — provider timeout and bounded retry with linear backoff

pub mod pipeline_settings;

pub use pipeline_settings::{PipelineSettings, QuestionStrategy, RetryPolicy};
