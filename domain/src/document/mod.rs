//! Structured planning documents.
//!
//! The field-level schema of each document lives with the validator
//! adapter; the domain only knows that a document is a JSON object tagged
//! with the stage that produced it.

use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Model output did not match the structure expected for its stage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaValidationError {
    #[error("{stage} output is not valid JSON: {message}")]
    NotJson { stage: Stage, message: String },

    #[error("{stage} output must be a JSON object")]
    NotAnObject { stage: Stage },

    #[error("{stage} output is missing required field '{field}'")]
    MissingField { stage: Stage, field: String },

    #[error("{stage} field '{field}' must be {expected}")]
    WrongType {
        stage: Stage,
        field: String,
        expected: String,
    },
}

/// A validated document produced by one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    stage: Stage,
    content: Value,
}

impl Document {
    pub fn new(stage: Stage, content: Value) -> Self {
        Self { stage, content }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    pub fn into_content(self) -> Value {
        self.content
    }

    /// Top-level string field, if present
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.content.get(name).and_then(Value::as_str)
    }

    /// Pretty JSON used both on disk and as prompt context
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.content).unwrap_or_else(|_| self.content.to_string())
    }
}
