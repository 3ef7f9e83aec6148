//! Provider endpoint settings (provider-neutral, serde-free).
//!
//! These types define the shape of per-backend HTTP settings without
//! depending on any serialization format (TOML, JSON, etc.).

use super::ProviderKind;

/// Endpoint settings for every supported backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub gemini: EndpointSettings,
    pub anthropic: EndpointSettings,
    pub openai: EndpointSettings,
}

impl ProviderSettings {
    pub fn endpoint(&self, kind: ProviderKind) -> &EndpointSettings {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::OpenAi => &self.openai,
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            gemini: EndpointSettings::default_for(ProviderKind::Gemini),
            anthropic: EndpointSettings::default_for(ProviderKind::Anthropic),
            openai: EndpointSettings::default_for(ProviderKind::OpenAi),
        }
    }
}

/// HTTP endpoint settings for one backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    /// Base URL of the API.
    pub base_url: String,
    /// Max tokens per response.
    pub max_tokens: u32,
    /// API version header (Anthropic only).
    pub api_version: Option<String>,
}

impl EndpointSettings {
    pub fn default_for(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Gemini => Self {
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                max_tokens: 8192,
                api_version: None,
            },
            ProviderKind::Anthropic => Self {
                base_url: "https://api.anthropic.com".to_string(),
                max_tokens: 8192,
                api_version: Some("2023-06-01".to_string()),
            },
            ProviderKind::OpenAi => Self {
                base_url: "https://api.openai.com".to_string(),
                max_tokens: 8192,
                api_version: None,
            },
        }
    }
}
