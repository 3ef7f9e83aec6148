//! HTTP provider clients behind one [`LlmGateway`].
//!
//! Each resolved binding is dispatched on its [`ProviderKind`] to the matching
//! client; all clients share one `reqwest` connection pool.

mod anthropic;
mod gemini;
mod http;
mod openai;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use pipeline_application::{LlmGateway, ProviderClient, ProviderError};
use pipeline_domain::{ProviderBinding, ProviderKind, ProviderSettings};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

pub struct HttpLlmGateway {
    http: Client,
    settings: ProviderSettings,
    timeout: Duration,
}

impl HttpLlmGateway {
    pub fn new(settings: ProviderSettings, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("product-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            settings,
            timeout,
        })
    }
}

impl LlmGateway for HttpLlmGateway {
    fn client(&self, binding: &ProviderBinding) -> Result<Arc<dyn ProviderClient>, ProviderError> {
        let provider = binding.provider();
        let endpoint = self.settings.endpoint(provider).clone();
        trace!(provider = %provider, base_url = %endpoint.base_url, "Building provider client");

        let http = self.http.clone();
        let binding = binding.clone();
        Ok(match provider {
            ProviderKind::Gemini => Arc::new(GeminiClient::new(http, endpoint, binding, self.timeout)),
            ProviderKind::Anthropic => {
                Arc::new(AnthropicClient::new(http, endpoint, binding, self.timeout))
            }
            ProviderKind::OpenAi => Arc::new(OpenAiClient::new(http, endpoint, binding, self.timeout)),
        })
    }
}
