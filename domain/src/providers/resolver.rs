//! Per-role provider resolution.
//!
//! Each field is resolved independently with the precedence
//! request override > role configuration > built-in default. The model
//! and credential reference in the role configuration only apply when that
//! configuration targets the same provider that was ultimately chosen.

use super::{ProviderKind, binding::Credentials, binding::ProviderBinding};
use crate::persona::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A provider could not be resolved into a usable binding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(
        "missing credential for {role} ({provider}): set {reference} or pass it with the request"
    )]
    MissingCredential {
        role: Role,
        provider: ProviderKind,
        reference: String,
    },

    #[error("empty model id configured for {role} ({provider})")]
    EmptyModel { role: Role, provider: ProviderKind },
}

/// Configured defaults for one role (`[llm.<role>]`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleProviderConfig {
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
}

impl RoleProviderConfig {
    fn applies_to(&self, provider: ProviderKind) -> bool {
        self.provider.is_none_or(|p| p == provider)
    }
}

/// Role-keyed provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LlmConfig(HashMap<Role, RoleProviderConfig>);

impl LlmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: Role, config: RoleProviderConfig) -> Self {
        self.0.insert(role, config);
        self
    }

    pub fn role(&self, role: Role) -> Option<&RoleProviderConfig> {
        self.0.get(&role)
    }
}

/// Caller-supplied provider selection for one role on one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderOverride {
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
}

impl ProviderOverride {
    pub fn provider(provider: ProviderKind) -> Self {
        Self {
            provider: Some(provider),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Stateless resolver; every call sees a fresh credential snapshot
pub struct ProviderResolver;

impl ProviderResolver {
    pub fn resolve(
        role: Role,
        request: Option<&ProviderOverride>,
        config: &LlmConfig,
        credentials: &Credentials,
    ) -> Result<ProviderBinding, ConfigurationError> {
        let configured = config.role(role);

        let provider = request
            .and_then(|o| o.provider)
            .or_else(|| configured.and_then(|c| c.provider))
            .unwrap_or_default();

        let inherited = configured.filter(|c| c.applies_to(provider));

        let model = request
            .and_then(|o| o.model.clone())
            .or_else(|| inherited.and_then(|c| c.model.clone()))
            .unwrap_or_else(|| provider.default_model().to_string());

        if model.trim().is_empty() {
            return Err(ConfigurationError::EmptyModel { role, provider });
        }

        let reference = inherited
            .and_then(|c| c.api_key_env.clone())
            .unwrap_or_else(|| provider.default_api_key_env().to_string());

        let secret = credentials.get(&reference).ok_or_else(|| {
            ConfigurationError::MissingCredential {
                role,
                provider,
                reference: reference.clone(),
            }
        })?;

        Ok(ProviderBinding::new(
            role,
            provider,
            model.trim(),
            reference.as_str(),
            secret,
        ))
    }
}
