//! Application layer for product-pipeline
//!
//! This crate contains use cases, port definitions, the task registry and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod service;
pub mod tasks;
pub mod use_cases;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{PipelineSettings, QuestionStrategy, RetryPolicy};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    credentials::{CredentialSource, StaticCredentials},
    document_store::{DocumentEntry, DocumentStore, DocumentStoreFactory, StoreError},
    llm_gateway::{LlmGateway, ProviderClient, ProviderError},
    persona_store::{PersonaError, PersonaStore},
    progress::{NoProgress, ProgressNotifier, ProgressSpan},
    schema_validator::SchemaValidator,
};
pub use service::{ExecuteRequest, PipelineService};
pub use tasks::{ProgressBroadcaster, ProgressSubscription, TaskManager, TaskProgress, TaskWatch};
pub use use_cases::check_keys::{CheckKeysUseCase, KeyState, KeyStatus};
pub use use_cases::execute_stage::{
    ExecuteStageUseCase, PipelineError, SessionSummary, StageInput, StageOutcome,
};
pub use use_cases::feedback_gate::FeedbackGate;
pub use use_cases::generate_document::{
    GenerateDocumentUseCase, GenerationError, GenerationRequest,
};
pub use use_cases::run_conversation::{
    Participant, RunConversationInput, RunConversationUseCase, SessionError,
};
