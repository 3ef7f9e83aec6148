//! `[pipeline]` section

use super::ConfigValidationError;
use pipeline_application::{PipelineSettings, QuestionStrategy, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    /// Questions asked per Q&A session
    pub question_count: usize,
    /// "iterative" or "batch"
    pub question_strategy: String,
    /// Fold the design Q&A back into the requirements document
    pub refine_requirements: bool,
    /// Upper bound for one provider call
    pub provider_timeout_seconds: u64,
    /// Retries after a failed generation call
    pub max_retries: u32,
    /// Linear backoff step between retries
    pub retry_backoff_ms: u64,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        let defaults = PipelineSettings::default();
        Self {
            question_count: defaults.question_count,
            question_strategy: defaults.question_strategy.as_str().to_string(),
            refine_requirements: defaults.refine_requirements,
            provider_timeout_seconds: defaults.retry.timeout.as_secs(),
            max_retries: defaults.retry.max_retries,
            retry_backoff_ms: defaults.retry.backoff.as_millis() as u64,
        }
    }
}

impl FilePipelineConfig {
    pub fn to_settings(&self) -> Result<PipelineSettings, ConfigValidationError> {
        if self.provider_timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.question_count == 0 {
            return Err(ConfigValidationError::InvalidQuestionCount);
        }
        let strategy: QuestionStrategy = self
            .question_strategy
            .parse()
            .map_err(|_| ConfigValidationError::UnknownStrategy(self.question_strategy.clone()))?;

        Ok(PipelineSettings::default()
            .with_question_count(self.question_count)
            .with_question_strategy(strategy)
            .with_refine_requirements(self.refine_requirements)
            .with_retry(RetryPolicy::with_timeout(
                Duration::from_secs(self.provider_timeout_seconds),
                self.max_retries,
                Duration::from_millis(self.retry_backoff_ms),
            )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_is_rejected() {
        let config = FilePipelineConfig {
            provider_timeout_seconds: 0,
            ..Default::default()
        };
        assert_eq!(config.to_settings(), Err(ConfigValidationError::InvalidTimeout));
    }

    #[test]
    fn test_zero_questions_is_rejected() {
        let config = FilePipelineConfig {
            question_count: 0,
            ..Default::default()
        };
        assert_eq!(
            config.to_settings(),
            Err(ConfigValidationError::InvalidQuestionCount)
        );
    }

    #[test]
    fn test_unknown_strategy() {
        let config = FilePipelineConfig {
            question_strategy: "random".into(),
            ..Default::default()
        };
        assert_eq!(
            config.to_settings(),
            Err(ConfigValidationError::UnknownStrategy("random".into()))
        );
    }

    #[test]
    fn test_retry_settings_map_through() {
        let config = FilePipelineConfig {
            max_retries: 0,
            retry_backoff_ms: 250,
            ..Default::default()
        };
        let retry = config.to_settings().unwrap().retry;
        assert_eq!(retry.max_retries, 0);
        assert_eq!(retry.backoff, Duration::from_millis(250));
    }
}
