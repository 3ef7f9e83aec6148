//! Schema validation port

use pipeline_domain::{Document, SchemaValidationError, Stage};

/// Turns normalized model output into a structured [`Document`]
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, stage: Stage, normalized: &str) -> Result<Document, SchemaValidationError>;
}
