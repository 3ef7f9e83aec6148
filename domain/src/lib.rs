//! Domain layer for product-pipeline
//!
//! This crate contains the core business rules, entities, and value objects
//! of the planning pipeline. It has no dependencies on infrastructure or
//! presentation concerns and performs no I/O.
//!
//! # Core Concepts
//!
//! ## Stages and Tasks
//!
//! The pipeline produces planning documents in a fixed order
//! (requirements → design → tickets). Each invocation of a [`Stage`] is a
//! [`Task`] whose lifecycle is a strict state machine:
//! `pending → running → {completed | failed}`.
//!
//! ## Personas and Providers
//!
//! Every generation call is made on behalf of a [`Role`] (strategist,
//! designer, product owner). The [`ProviderResolver`] decides which backend,
//! model and credential serve that role for one call.
//!
//! ## Conversations
//!
//! Before drafting, one persona may interview the others. The resulting
//! [`ConversationSession`] is an ordered list of [`QaExchange`]s.

pub mod conversation;
pub mod core;
pub mod document;
pub mod feedback;
pub mod persona;
pub mod prompt;
pub mod providers;
pub mod stage;
pub mod task;

// Re-export commonly used types
pub use conversation::{
    entities::{ConversationSession, QaExchange, RespondentAnswer, RespondentEntry},
    parsing::{parse_question, parse_questions},
};
pub use core::{
    error::DomainError,
    text::strip_code_fences,
};
pub use document::{Document, SchemaValidationError};
pub use feedback::{FEEDBACK_HEADING, FeedbackRecord};
pub use persona::{AgentPersona, PersonaSelection, Role};
pub use prompt::{PromptTemplate, SourceDocument};
pub use providers::{
    ProviderKind,
    binding::{Credentials, ProviderBinding},
    resolver::{
        ConfigurationError, LlmConfig, ProviderOverride, ProviderResolver, RoleProviderConfig,
    },
    settings::{EndpointSettings, ProviderSettings},
};
pub use stage::Stage;
pub use task::{
    entities::{Task, TaskId, TaskStatus},
    events::{ProgressEvent, ProgressEventKind, TaskEvent},
    error::TransitionError,
};
