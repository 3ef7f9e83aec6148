//! Filesystem document store
//!
//! Layout under the output directory:
//!
//! ```text
//! brd.json
//! design-spec.json
//! development-tickets.json
//! conversations/<session>.md
//! conversations/feedback/<stem>-feedback.md
//! ```

use async_trait::async_trait;
use pipeline_application::{DocumentEntry, DocumentStore, DocumentStoreFactory, StoreError};
use pipeline_domain::{ConversationSession, Document, Stage};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const CONVERSATIONS_DIR: &str = "conversations";
const FEEDBACK_DIR: &str = "feedback";

pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_file(stage: Stage) -> &'static str {
        match stage {
            Stage::Requirements => "brd.json",
            Stage::Design => "design-spec.json",
            Stage::Tickets => "development-tickets.json",
        }
    }

    fn document_path(&self, stage: Stage) -> PathBuf {
        self.root.join(Self::document_file(stage))
    }

    fn transcript_path(&self, session_name: &str) -> Option<PathBuf> {
        let valid = !session_name.is_empty()
            && session_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| {
            self.root
                .join(CONVERSATIONS_DIR)
                .join(format!("{session_name}.md"))
        })
    }

    fn feedback_path(&self, stage: Stage) -> PathBuf {
        self.root
            .join(CONVERSATIONS_DIR)
            .join(FEEDBACK_DIR)
            .join(format!("{}-feedback.md", stage.file_stem()))
    }

    async fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(path, e)),
        }
    }

    async fn write_file(path: &Path, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| io_error(path, e))
    }

    async fn exists(path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    async fn read_feedback(&self, stage: Stage) -> Result<Option<String>, StoreError> {
        let text = Self::read_optional(&self.feedback_path(stage)).await?;
        Ok(text.filter(|t| !t.trim().is_empty()))
    }

    async fn write_feedback(&self, stage: Stage, text: &str) -> Result<(), StoreError> {
        let path = self.feedback_path(stage);
        Self::write_file(&path, text).await?;
        info!(stage = %stage, path = %path.display(), "Feedback saved");
        Ok(())
    }

    async fn remove_feedback(&self, stage: Stage) -> Result<bool, StoreError> {
        let path = self.feedback_path(stage);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(stage = %stage, "Feedback removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn read_document(&self, stage: Stage) -> Result<Option<Document>, StoreError> {
        let path = self.document_path(stage);
        let Some(text) = Self::read_optional(&path).await? else {
            return Ok(None);
        };

        let content = serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(Document::new(stage, content)))
    }

    async fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        let path = self.document_path(document.stage());
        Self::write_file(&path, &document.to_pretty_json()).await?;
        debug!(stage = %document.stage(), path = %path.display(), "Document written");
        Ok(())
    }

    async fn write_transcript(&self, session: &ConversationSession) -> Result<(), StoreError> {
        let path = self
            .transcript_path(session.name())
            .ok_or_else(|| StoreError::Io {
                path: session.name().to_string(),
                message: "invalid session name".into(),
            })?;
        Self::write_file(&path, &session.to_markdown()).await?;
        debug!(session = session.name(), path = %path.display(), "Transcript written");
        Ok(())
    }

    async fn read_transcript(&self, session_name: &str) -> Result<Option<String>, StoreError> {
        match self.transcript_path(session_name) {
            Some(path) => Self::read_optional(&path).await,
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<DocumentEntry>, StoreError> {
        let mut entries = Vec::with_capacity(Stage::ALL.len());
        for stage in Stage::ALL {
            let transcript = match stage.session_name().and_then(|n| self.transcript_path(n)) {
                Some(path) => Some(Self::exists(&path).await),
                None => None,
            };
            entries.push(DocumentEntry {
                stage,
                name: stage.display_name().to_string(),
                file: Self::document_file(stage).to_string(),
                exists: Self::exists(&self.document_path(stage)).await,
                transcript,
                has_feedback: self.read_feedback(stage).await?.is_some(),
            });
        }
        Ok(entries)
    }
}

/// Opens one [`FsDocumentStore`] per output directory
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDocumentStoreFactory;

impl DocumentStoreFactory for FsDocumentStoreFactory {
    fn open(&self, location: &str) -> Arc<dyn DocumentStore> {
        Arc::new(FsDocumentStore::new(location))
    }
}
