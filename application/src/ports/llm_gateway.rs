//! LLM Gateway port
//!
//! Defines the interface for calling generative-text providers. Each
//! resolved [`ProviderBinding`] is turned into a [`ProviderClient`] by the
//! gateway; the closed set of backends lives behind this one capability.

use async_trait::async_trait;
use pipeline_domain::{ProviderBinding, ProviderKind, strip_code_fences};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a provider call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{provider} transport error: {message}")]
    Transport {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider} rejected the credential: {message}")]
    Auth {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider} rate limit exceeded")]
    RateLimited {
        provider: ProviderKind,
        retry_after: Option<Duration>,
    },

    #[error("{provider} server error (HTTP {status}): {message}")]
    Server {
        provider: ProviderKind,
        status: u16,
        message: String,
    },

    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("{provider} returned an unusable response: {message}")]
    InvalidResponse {
        provider: ProviderKind,
        message: String,
    },
}

impl ProviderError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Transport { .. }
                | ProviderError::RateLimited { .. }
                | ProviderError::Server { .. }
                | ProviderError::Timeout(_)
        )
    }

    /// Server-suggested wait before retrying
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// A client bound to one provider, model and credential
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// The binding this client was built from
    fn binding(&self) -> &ProviderBinding;

    /// Single-turn generation with a system context (the persona)
    async fn generate(&self, prompt: &str, system_context: &str) -> Result<String, ProviderError>;

    /// Remove enclosing code-fence decoration; never alters content
    fn normalize(&self, raw: &str) -> String {
        strip_code_fences(raw)
    }
}

/// Gateway for provider communication
///
/// This port defines how the application layer reaches providers.
/// Implementations (adapters) live in the infrastructure layer.
pub trait LlmGateway: Send + Sync {
    /// Build a client for a resolved binding
    fn client(&self, binding: &ProviderBinding) -> Result<Arc<dyn ProviderClient>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let provider = ProviderKind::Gemini;
        assert!(ProviderError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(
            ProviderError::Server {
                provider,
                status: 503,
                message: "overloaded".into()
            }
            .is_retryable()
        );
        assert!(
            !ProviderError::Auth {
                provider,
                message: "bad key".into()
            }
            .is_retryable()
        );
        assert!(
            !ProviderError::InvalidResponse {
                provider,
                message: "no candidates".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_retry_after_only_for_rate_limit() {
        let limited = ProviderError::RateLimited {
            provider: ProviderKind::Anthropic,
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(ProviderError::Timeout(Duration::ZERO).retry_after(), None);
    }
}
