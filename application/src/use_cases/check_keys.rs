//! Check Keys
//!
//! Reports, per role, which provider and credential the resolver would pick
//! and whether that credential is set. With a live check each present key is
//! also used for one short call so a rejected key shows up before a run.

use crate::ports::credentials::CredentialSource;
use crate::ports::llm_gateway::{LlmGateway, ProviderError};
use crate::use_cases::shared::generate_with_timeout;
use pipeline_domain::{ConfigurationError, LlmConfig, ProviderKind, ProviderResolver, Role};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const CHECK_PROMPT: &str = "Reply with OK";

/// Outcome for one role's credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum KeyState {
    /// Set, not used
    Present,
    /// Set and accepted by the provider
    Valid,
    /// Set but rejected by the provider
    Invalid { message: String },
    /// Set, but the provider could not be reached or answered with an error
    Unverified { message: String },
    Missing,
    /// The role configuration itself is unusable
    Misconfigured { message: String },
}

impl KeyState {
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Present | Self::Valid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyStatus {
    pub role: Role,
    pub provider: ProviderKind,
    pub model: Option<String>,
    /// Environment variable the key is read from
    pub reference: Option<String>,
    #[serde(flatten)]
    pub state: KeyState,
}

pub struct CheckKeysUseCase {
    credentials: Arc<dyn CredentialSource>,
    llm: LlmConfig,
}

impl CheckKeysUseCase {
    pub fn new(credentials: Arc<dyn CredentialSource>, llm: LlmConfig) -> Self {
        Self { credentials, llm }
    }

    /// Resolve every role and report whether its credential is set
    pub fn check(&self) -> Vec<KeyStatus> {
        let credentials = self.credentials.snapshot();
        Role::ALL
            .iter()
            .map(|&role| match ProviderResolver::resolve(role, None, &self.llm, &credentials) {
                Ok(binding) => KeyStatus {
                    role,
                    provider: binding.provider(),
                    model: Some(binding.model().to_string()),
                    reference: Some(binding.credential_ref().to_string()),
                    state: KeyState::Present,
                },
                Err(ConfigurationError::MissingCredential {
                    provider, reference, ..
                }) => KeyStatus {
                    role,
                    provider,
                    model: None,
                    reference: Some(reference),
                    state: KeyState::Missing,
                },
                Err(ConfigurationError::EmptyModel { role, provider }) => KeyStatus {
                    role,
                    provider,
                    model: None,
                    reference: None,
                    state: KeyState::Misconfigured {
                        message: ConfigurationError::EmptyModel { role, provider }.to_string(),
                    },
                },
            })
            .collect()
    }

    /// Like [`check`](Self::check), then make one short call with each present key
    pub async fn check_live(&self, gateway: &dyn LlmGateway, timeout: Duration) -> Vec<KeyStatus> {
        let credentials = self.credentials.snapshot();
        let mut statuses = self.check();

        for status in statuses.iter_mut().filter(|s| s.state == KeyState::Present) {
            let binding =
                match ProviderResolver::resolve(status.role, None, &self.llm, &credentials) {
                    Ok(binding) => binding,
                    Err(e) => {
                        status.state = KeyState::Misconfigured {
                            message: e.to_string(),
                        };
                        continue;
                    }
                };

            debug!(role = %status.role, provider = %status.provider, "Checking key with a live call");
            let result = match gateway.client(&binding) {
                Ok(client) => generate_with_timeout(client.as_ref(), CHECK_PROMPT, "", timeout).await,
                Err(e) => Err(e),
            };

            status.state = match result {
                Ok(_) => KeyState::Valid,
                Err(e @ ProviderError::Auth { .. }) => KeyState::Invalid {
                    message: e.to_string(),
                },
                Err(e) => KeyState::Unverified {
                    message: e.to_string(),
                },
            };
        }

        info!(
            usable = statuses.iter().filter(|s| s.state.is_usable()).count(),
            total = statuses.len(),
            "Key check finished"
        );
        statuses
    }
}
