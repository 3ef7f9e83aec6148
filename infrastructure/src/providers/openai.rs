//! OpenAI chat completions client

use super::http::send_json;
use async_trait::async_trait;
use pipeline_application::{ProviderClient, ProviderError};
use pipeline_domain::{EndpointSettings, ProviderBinding, ProviderKind};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct OpenAiClient {
    http: Client,
    endpoint: EndpointSettings,
    binding: ProviderBinding,
    timeout: Duration,
}

impl OpenAiClient {
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

    fn request_body<'a>(&'a self, prompt: &'a str, system_context: &'a str) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if !system_context.trim().is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system_context,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        ChatRequest {
            model: self.binding.model(),
            messages,
            max_tokens: self.endpoint.max_tokens,
        }
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn binding(&self) -> &ProviderBinding {
        &self.binding
    }

    async fn generate(&self, prompt: &str, system_context: &str) -> Result<String, ProviderError> {
        debug!(model = self.binding.model(), "Calling OpenAI");
        let request = self
            .http
            .post(format!("{}/v1/chat/completions", self.endpoint.base_url))
            .bearer_auth(self.binding.secret())
            .timeout(self.timeout)
            .json(&self.request_body(prompt, system_context));

        let response: ChatResponse = send_json(ProviderKind::OpenAi, request, self.timeout).await?;
        response.text()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn text(self) -> Result<String, ProviderError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: ProviderKind::OpenAi,
                message: "response contained no message content".into(),
            })
    }
}
