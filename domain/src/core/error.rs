//! Domain error types

use thiserror::Error;

/// Domain-level errors raised when parsing identifiers from untyped input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown stage: {0} (expected one of: requirements, design, tickets)")]
    UnknownStage(String),

    #[error("Unknown role: {0} (expected one of: strategist, designer, po)")]
    UnknownRole(String),

    #[error("Unknown provider: {0} (expected one of: gemini, anthropic, openai)")]
    UnknownProvider(String),

    #[error("Unknown question strategy: {0} (expected iterative or batch)")]
    UnknownStrategy(String),

    #[error("Invalid task id: {0}")]
    InvalidTaskId(String),
}
