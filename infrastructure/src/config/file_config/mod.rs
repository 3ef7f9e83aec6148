//! Raw TOML configuration data types
//!
//! These structs mirror the config file one-to-one. Enumerated values stay
//! strings here and are parsed (and validated) when converted to the
//! application and domain types.

mod llm;
mod pipeline;
mod providers;
mod runtime;

pub use llm::FileRoleConfig;
pub use pipeline::FilePipelineConfig;
pub use providers::{FileEndpointConfig, FileProvidersConfig};
pub use runtime::{FileLoggingConfig, FilePathsConfig, FileServerConfig};

use pipeline_application::PipelineSettings;
use pipeline_domain::{LlmConfig, ProviderSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Problems found in a loaded configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("pipeline.provider_timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("pipeline.question_count must be at least 1")]
    InvalidQuestionCount,

    #[error("pipeline.question_strategy: unknown value '{0}' (expected iterative or batch)")]
    UnknownStrategy(String),

    #[error("llm.{0}: unknown role (expected strategist, designer or po)")]
    UnknownRole(String),

    #[error("llm.{role}.provider: unknown provider '{value}'")]
    UnknownProvider { role: String, value: String },

    #[error("llm.{role}.model cannot be empty")]
    EmptyModelName { role: String },

    #[error("providers.{0}.base_url cannot be empty")]
    EmptyBaseUrl(&'static str),

    #[error("server.bind cannot be empty")]
    EmptyBind,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Stage execution settings
    pub pipeline: FilePipelineConfig,
    /// Per-role provider defaults, keyed by role name
    pub llm: BTreeMap<String, FileRoleConfig>,
    /// Endpoint settings per backend
    pub providers: FileProvidersConfig,
    pub server: FileServerConfig,
    pub paths: FilePathsConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.pipeline_settings()?;
        self.llm_config()?;
        self.providers.validate()?;
        if self.server.bind.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBind);
        }
        Ok(())
    }

    pub fn pipeline_settings(&self) -> Result<PipelineSettings, ConfigValidationError> {
        self.pipeline.to_settings()
    }

    pub fn llm_config(&self) -> Result<LlmConfig, ConfigValidationError> {
        self.llm
            .iter()
            .try_fold(LlmConfig::new(), |config, (name, entry)| {
                let (role, parsed) = entry.parse(name)?;
                Ok(config.with_role(role, parsed))
            })
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        self.providers.to_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_application::QuestionStrategy;
    use pipeline_domain::{ProviderKind, Role};
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[pipeline]
question_count = 3
question_strategy = "batch"
refine_requirements = false
provider_timeout_seconds = 60

[llm.strategist]
provider = "claude"
model = "claude-opus-4"

[llm.po]
api_key_env = "TEAM_GEMINI_KEY"

[providers.openai]
base_url = "https://openai.internal.example"

[server]
bind = "0.0.0.0:9000"

[paths]
output_dir = "out/product"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        config.validate().unwrap();

        let settings = config.pipeline_settings().unwrap();
        assert_eq!(settings.question_count, 3);
        assert_eq!(settings.question_strategy, QuestionStrategy::Batch);
        assert!(!settings.refine_requirements);
        assert_eq!(settings.retry.timeout, Duration::from_secs(60));

        let llm = config.llm_config().unwrap();
        let strategist = llm.role(Role::Strategist).unwrap();
        assert_eq!(strategist.provider, Some(ProviderKind::Anthropic));
        assert_eq!(strategist.model.as_deref(), Some("claude-opus-4"));
        assert_eq!(
            llm.role(Role::ProductOwner).unwrap().api_key_env.as_deref(),
            Some("TEAM_GEMINI_KEY")
        );
        assert!(llm.role(Role::Designer).is_none());

        let providers = config.provider_settings();
        assert_eq!(providers.openai.base_url, "https://openai.internal.example");
        assert_eq!(providers.openai.max_tokens, 8192);
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.paths.output_dir.to_str(), Some("out/product"));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline_settings().unwrap(), PipelineSettings::default());
        assert_eq!(config.llm_config().unwrap(), LlmConfig::new());
    }

    #[test]
    fn test_validate_unknown_role() {
        let config: FileConfig = toml::from_str("[llm.marketing]\nprovider = \"gemini\"").unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::UnknownRole("marketing".into()))
        );
    }

    #[test]
    fn test_validate_unknown_provider() {
        let config: FileConfig = toml::from_str("[llm.designer]\nprovider = \"mistral\"").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn test_validate_empty_bind() {
        let config: FileConfig = toml::from_str("[server]\nbind = \" \"").unwrap();
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyBind));
    }
}
