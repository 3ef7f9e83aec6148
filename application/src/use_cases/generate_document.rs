//! Generation Step
//!
//! Composes persona, prior documents, session context and feedback into a
//! single provider call, normalizes the output and hands it to schema
//! validation. Provider failures are retried per [`RetryPolicy`]; schema
//! failures are final.

use crate::config::RetryPolicy;
use crate::ports::llm_gateway::{LlmGateway, ProviderError};
use crate::ports::schema_validator::SchemaValidator;
use crate::use_cases::shared::generate_with_retry;
use pipeline_domain::{
    AgentPersona, Document, PromptTemplate, ProviderBinding, SchemaValidationError,
    SourceDocument, Stage,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that fail a generation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
}

/// What to generate and with whom
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub stage: Stage,
    pub author: &'a AgentPersona,
    pub binding: &'a ProviderBinding,
    pub sources: &'a [SourceDocument<'a>],
    /// Folded Q&A transcript, if a session ran
    pub session_context: Option<&'a str>,
    /// Feedback block from the feedback gate
    pub feedback_block: Option<&'a str>,
}

/// Use case for one validated document generation
pub struct GenerateDocumentUseCase {
    gateway: Arc<dyn LlmGateway>,
    validator: Arc<dyn SchemaValidator>,
    retry: RetryPolicy,
}

impl GenerateDocumentUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        validator: Arc<dyn SchemaValidator>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            gateway,
            validator,
            retry,
        }
    }

    /// Draft the stage's document
    pub async fn generate(&self, request: GenerationRequest<'_>) -> Result<Document, GenerationError> {
        let prompt = PromptTemplate::generation(
            request.stage,
            request.sources,
            request.session_context,
            request.feedback_block,
        );
        self.complete(request.stage, request.author, request.binding, &prompt)
            .await
    }

    /// Rewrite the requirements document using a Q&A transcript
    pub async fn refine_requirements(
        &self,
        author: &AgentPersona,
        binding: &ProviderBinding,
        requirements: &Document,
        transcript: &str,
    ) -> Result<Document, GenerationError> {
        let prompt =
            PromptTemplate::refine_requirements(&requirements.to_pretty_json(), transcript);
        self.complete(Stage::Requirements, author, binding, &prompt)
            .await
    }

    async fn complete(
        &self,
        stage: Stage,
        author: &AgentPersona,
        binding: &ProviderBinding,
        prompt: &str,
    ) -> Result<Document, GenerationError> {
        info!(
            stage = %stage,
            role = %author.role(),
            provider = %binding.provider(),
            model = binding.model(),
            "Generating document"
        );

        let client = self.gateway.client(binding)?;
        let raw = generate_with_retry(&*client, prompt, author.context(), &self.retry).await?;
        let normalized = client.normalize(&raw);
        debug!(stage = %stage, chars = normalized.len(), "Provider output normalized");

        self.validator
            .validate(stage, &normalized)
            .map_err(|e| {
                warn!(stage = %stage, "Output failed validation: {}", e);
                GenerationError::Schema(e)
            })
    }
}
