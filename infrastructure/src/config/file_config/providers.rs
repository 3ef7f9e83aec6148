//! Provider endpoint configuration (`[providers]` section)

use super::ConfigValidationError;
use pipeline_domain::{EndpointSettings, ProviderKind, ProviderSettings};
use serde::{Deserialize, Serialize};

/// HTTP settings for one backend.
///
/// Fields left out of the file fall back to the backend's built-in values,
/// so each backend keeps its own default URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEndpointConfig {
    /// Base URL of the API (e.g. a proxy or Azure OpenAI deployment)
    pub base_url: Option<String>,
    /// Max tokens per response
    pub max_tokens: Option<u32>,
    /// API version header (Anthropic only)
    pub api_version: Option<String>,
}

impl FileEndpointConfig {
    fn to_settings(&self, kind: ProviderKind) -> EndpointSettings {
        let defaults = EndpointSettings::default_for(kind);
        EndpointSettings {
            base_url: self
                .base_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            api_version: self.api_version.clone().or(defaults.api_version),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub gemini: FileEndpointConfig,
    pub anthropic: FileEndpointConfig,
    pub openai: FileEndpointConfig,
}

impl FileProvidersConfig {
    pub fn to_settings(&self) -> ProviderSettings {
        ProviderSettings {
            gemini: self.gemini.to_settings(ProviderKind::Gemini),
            anthropic: self.anthropic.to_settings(ProviderKind::Anthropic),
            openai: self.openai.to_settings(ProviderKind::OpenAi),
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigValidationError> {
        for (kind, endpoint) in [
            (ProviderKind::Gemini, &self.gemini),
            (ProviderKind::Anthropic, &self.anthropic),
            (ProviderKind::OpenAi, &self.openai),
        ] {
            if let Some(url) = &endpoint.base_url
                && url.trim().is_empty()
            {
                return Err(ConfigValidationError::EmptyBaseUrl(kind.as_str()));
            }
        }
        Ok(())
    }
}
