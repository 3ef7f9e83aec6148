//! Gemini `generateContent` client

use super::http::send_json;
use async_trait::async_trait;
use pipeline_application::{ProviderClient, ProviderError};
use pipeline_domain::{EndpointSettings, ProviderBinding, ProviderKind};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct GeminiClient {
    http: Client,
    endpoint: EndpointSettings,
    binding: ProviderBinding,
    timeout: Duration,
}

impl GeminiClient {
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

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.base_url,
            self.binding.model()
        )
    }

    fn request_body<'a>(&self, prompt: &'a str, system_context: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            system_instruction: (!system_context.trim().is_empty()).then(|| Content {
                role: None,
                parts: vec![Part {
                    text: system_context,
                }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.endpoint.max_tokens,
            },
        }
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn binding(&self) -> &ProviderBinding {
        &self.binding
    }

    async fn generate(&self, prompt: &str, system_context: &str) -> Result<String, ProviderError> {
        debug!(model = self.binding.model(), "Calling Gemini");
        let request = self
            .http
            .post(self.url())
            .header("x-goog-api-key", self.binding.secret())
            .timeout(self.timeout)
            .json(&self.request_body(prompt, system_context));

        let response: GenerateContentResponse =
            send_json(ProviderKind::Gemini, request, self.timeout).await?;
        response.text()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(rename = "system_instruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(self) -> Result<String, ProviderError> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::InvalidResponse {
                provider: ProviderKind::Gemini,
                message: "response contained no text".into(),
            });
        }
        Ok(text)
    }
}
