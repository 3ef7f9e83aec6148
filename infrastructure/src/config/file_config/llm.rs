//! `[llm.<role>]` sections

use super::ConfigValidationError;
use pipeline_domain::{ProviderKind, Role, RoleProviderConfig};
use serde::{Deserialize, Serialize};

/// Provider defaults for one role
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRoleConfig {
    /// "gemini", "anthropic" (or "claude"), "openai"
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
}

impl FileRoleConfig {
    /// Parse the entry found under `[llm.<name>]`
    pub fn parse(&self, name: &str) -> Result<(Role, RoleProviderConfig), ConfigValidationError> {
        let role: Role = name
            .parse()
            .map_err(|_| ConfigValidationError::UnknownRole(name.to_string()))?;

        let provider = self
            .provider
            .as_deref()
            .map(|value| {
                value
                    .parse::<ProviderKind>()
                    .map_err(|_| ConfigValidationError::UnknownProvider {
                        role: name.to_string(),
                        value: value.to_string(),
                    })
            })
            .transpose()?;

        if let Some(model) = &self.model
            && model.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyModelName {
                role: name.to_string(),
            });
        }

        Ok((
            role,
            RoleProviderConfig {
                provider,
                model: self.model.clone(),
                api_key_env: self.api_key_env.clone().filter(|v| !v.trim().is_empty()),
            },
        ))
    }
}
