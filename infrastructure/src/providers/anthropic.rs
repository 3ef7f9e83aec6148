//! Anthropic Messages API client

use super::http::send_json;
use async_trait::async_trait;
use pipeline_application::{ProviderClient, ProviderError};
use pipeline_domain::{EndpointSettings, ProviderBinding, ProviderKind};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: Client,
    endpoint: EndpointSettings,
    binding: ProviderBinding,
    timeout: Duration,
}

impl AnthropicClient {
    pub fn new(
        http: Client,
        endpoint: EndpointSettings,
        binding: ProviderBinding,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoint,
            binding,
            timeout,
        }
    }

    fn request_body<'a>(&'a self, prompt: &'a str, system_context: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: self.binding.model(),
            max_tokens: self.endpoint.max_tokens,
            system: (!system_context.trim().is_empty()).then_some(system_context),
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        }
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn binding(&self) -> &ProviderBinding {
        &self.binding
    }

    async fn generate(&self, prompt: &str, system_context: &str) -> Result<String, ProviderError> {
        debug!(model = self.binding.model(), "Calling Anthropic");
        let version = self
            .endpoint
            .api_version
            .as_deref()
            .unwrap_or(DEFAULT_API_VERSION);

        let request = self
            .http
            .post(format!("{}/v1/messages", self.endpoint.base_url))
            .header("x-api-key", self.binding.secret())
            .header("anthropic-version", version)
            .timeout(self.timeout)
            .json(&self.request_body(prompt, system_context));

        let response: MessagesResponse =
            send_json(ProviderKind::Anthropic, request, self.timeout).await?;
        response.text()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl MessagesResponse {
    fn text(self) -> Result<String, ProviderError> {
        let text: String = self
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            return Err(ProviderError::InvalidResponse {
                provider: ProviderKind::Anthropic,
                message: "response contained no text blocks".into(),
            });
        }
        Ok(text)
    }
}
