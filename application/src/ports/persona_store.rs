//! Persona store port

use async_trait::async_trait;
use pipeline_domain::{AgentPersona, Role};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersonaError {
    #[error("persona '{name}' not found at {path}")]
    NotFound { name: String, path: String },

    #[error("persona '{name}' is invalid: {message}")]
    Invalid { name: String, message: String },
}

/// Loads persona context text; the pipeline treats it as opaque
#[async_trait]
pub trait PersonaStore: Send + Sync {
    /// Load the persona for `role`, or the named variant when `name` is given
    async fn load_persona(&self, role: Role, name: Option<&str>)
    -> Result<AgentPersona, PersonaError>;
}
