//! Shared utilities for use cases.
//!
//! Bounded provider calls used by the conversation orchestrator (timeout
//! only) and the generation step (timeout plus bounded retry).

use crate::config::RetryPolicy;
use crate::ports::llm_gateway::{ProviderClient, ProviderError};
use std::time::Duration;
use tracing::warn;

/// Call the provider, surfacing an elapsed timeout as [`ProviderError::Timeout`].
pub(crate) async fn generate_with_timeout(
    client: &dyn ProviderClient,
    prompt: &str,
    system_context: &str,
    timeout: Duration,
) -> Result<String, ProviderError> {
    match tokio::time::timeout(timeout, client.generate(prompt, system_context)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(timeout)),
    }
}

/// Call the provider, retrying transient failures per `policy`.
///
/// Non-retryable errors (auth, invalid response) are returned on first sight.
pub(crate) async fn generate_with_retry(
    client: &dyn ProviderClient,
    prompt: &str,
    system_context: &str,
    policy: &RetryPolicy,
) -> Result<String, ProviderError> {
    let mut attempt = 0;
    loop {
        match generate_with_timeout(client, prompt, system_context, policy.timeout).await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for(attempt, e.retry_after());
                let binding = client.binding();
                warn!(
                    provider = %binding.provider(),
                    model = binding.model(),
                    attempt,
                    "Provider call failed, retrying in {:?}: {}",
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
