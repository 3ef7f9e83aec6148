//! Pipeline execution parameters.
//!
//! [`PipelineSettings`] groups the static parameters that control stage
//! execution. These are application-layer concerns, not domain policy; the
//! infrastructure config loader maps the `[pipeline]` TOML section onto them.

use pipeline_domain::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// How the questioner produces its questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStrategy {
    /// One call per question, each seeing the exchanges so far
    #[default]
    Iterative,
    /// One call returning a numbered list
    Batch,
}

impl QuestionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStrategy::Iterative => "iterative",
            QuestionStrategy::Batch => "batch",
        }
    }
}

impl std::fmt::Display for QuestionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QuestionStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "iterative" => Ok(QuestionStrategy::Iterative),
            "batch" => Ok(QuestionStrategy::Batch),
            other => Err(DomainError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Timeout and retry behaviour for provider calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound for a single provider call
    pub timeout: Duration,
    /// Retries after the first attempt (0 disables retrying)
    pub max_retries: u32,
    /// Multiplied by the attempt number to get the wait before a retry
    pub backoff: Duration,
    /// Longest wait before a retry, whatever the server asks for
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_retries: 2,
            backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given call timeout; retry waits are capped at the same value.
    pub fn with_timeout(timeout: Duration, max_retries: u32, backoff: Duration) -> Self {
        Self {
            timeout,
            max_retries,
            backoff,
            max_backoff: timeout,
        }
    }

    /// Wait before retry number `attempt` (1-based).
    ///
    /// A server-provided `Retry-After` wins when it is longer. The result
    /// never exceeds `max_backoff`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let linear = self.backoff.saturating_mul(attempt);
        let delay = match retry_after {
            Some(hint) if hint > linear => hint,
            _ => linear,
        };
        delay.min(self.max_backoff)
    }
}

/// Stage execution parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Questions asked per Q&A session
    pub question_count: usize,
    pub question_strategy: QuestionStrategy,
    /// Fold the design Q&A back into the requirements document
    pub refine_requirements: bool,
    pub retry: RetryPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            question_count: 5,
            question_strategy: QuestionStrategy::default(),
            refine_requirements: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineSettings {
    // ==================== Builder Methods ====================

    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = count;
        self
    }

    pub fn with_question_strategy(mut self, strategy: QuestionStrategy) -> Self {
        self.question_strategy = strategy;
        self
    }

    pub fn with_refine_requirements(mut self, enabled: bool) -> Self {
        self.refine_requirements = enabled;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
