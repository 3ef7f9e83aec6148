//! Document store port
//!
//! The pipeline reads prior documents and feedback, and writes generated
//! documents and Q&A transcripts, only through this contract. One store is
//! opened per output location.

use async_trait::async_trait;
use pipeline_domain::{ConversationSession, Document, Stage};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a document store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("{path} is not a readable document: {message}")]
    Corrupt { path: String, message: String },
}

/// Listing entry for one stage's artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    pub stage: Stage,
    pub name: String,
    pub file: String,
    pub exists: bool,
    /// Whether the stage's Q&A transcript exists (`None` for stages without one)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<bool>,
    pub has_feedback: bool,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Human-readable location (e.g. the output directory)
    fn location(&self) -> String;

    /// Feedback text for `stage`; blank counts as absent
    async fn read_feedback(&self, stage: Stage) -> Result<Option<String>, StoreError>;

    async fn write_feedback(&self, stage: Stage, text: &str) -> Result<(), StoreError>;

    /// Returns whether anything was removed
    async fn remove_feedback(&self, stage: Stage) -> Result<bool, StoreError>;

    /// Previously generated document for `stage`, if any
    async fn read_document(&self, stage: Stage) -> Result<Option<Document>, StoreError>;

    async fn write_document(&self, document: &Document) -> Result<(), StoreError>;

    async fn write_transcript(&self, session: &ConversationSession) -> Result<(), StoreError>;

    async fn read_transcript(&self, session_name: &str) -> Result<Option<String>, StoreError>;

    async fn list(&self) -> Result<Vec<DocumentEntry>, StoreError>;
}

/// Opens a [`DocumentStore`] for an output location chosen per request
pub trait DocumentStoreFactory: Send + Sync {
    fn open(&self, location: &str) -> Arc<dyn DocumentStore>;
}
