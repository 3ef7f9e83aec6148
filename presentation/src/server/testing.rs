//! Test doubles for the API handlers.

use super::AppState;
use async_trait::async_trait;
use pipeline_application::{
    DocumentEntry, DocumentStore, DocumentStoreFactory, ExecuteStageUseCase, LlmGateway,
    NoConversationLogger, PersonaError, PersonaStore, PipelineService, PipelineSettings,
    ProviderClient, ProviderError, SchemaValidator, StaticCredentials, StoreError, TaskManager,
};
use pipeline_domain::{
    AgentPersona, ConversationSession, Credentials, Document, LlmConfig, ProviderBinding, Role,
    SchemaValidationError, Stage,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Gateway with no reachable backend
struct OfflineGateway;

impl LlmGateway for OfflineGateway {
    fn client(&self, binding: &ProviderBinding) -> Result<Arc<dyn ProviderClient>, ProviderError> {
        Err(ProviderError::Transport {
            provider: binding.provider(),
            message: "offline".to_string(),
        })
    }
}

struct RolePersonas;

#[async_trait]
impl PersonaStore for RolePersonas {
    async fn load_persona(
        &self,
        role: Role,
        _name: Option<&str>,
    ) -> Result<AgentPersona, PersonaError> {
        Ok(AgentPersona::new(role, role.display_name()))
    }
}

struct AcceptAll;

impl SchemaValidator for AcceptAll {
    fn validate(&self, stage: Stage, normalized: &str) -> Result<Document, SchemaValidationError> {
        let content = serde_json::from_str(normalized)
            .map_err(|e| SchemaValidationError::NotJson {
                stage,
                message: e.to_string(),
            })?;
        Ok(Document::new(stage, content))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<Stage, Document>>,
    feedback: Mutex<HashMap<Stage, String>>,
    transcripts: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    async fn read_feedback(&self, stage: Stage) -> Result<Option<String>, StoreError> {
        Ok(self.feedback.lock().unwrap().get(&stage).cloned())
    }

    async fn write_feedback(&self, stage: Stage, text: &str) -> Result<(), StoreError> {
        self.feedback.lock().unwrap().insert(stage, text.to_string());
        Ok(())
    }

    async fn remove_feedback(&self, stage: Stage) -> Result<bool, StoreError> {
        Ok(self.feedback.lock().unwrap().remove(&stage).is_some())
    }

    async fn read_document(&self, stage: Stage) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.lock().unwrap().get(&stage).cloned())
    }

    async fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        self.documents
            .lock()
            .unwrap()
            .insert(document.stage(), document.clone());
        Ok(())
    }

    async fn write_transcript(&self, session: &ConversationSession) -> Result<(), StoreError> {
        self.transcripts
            .lock()
            .unwrap()
            .insert(session.name().to_string(), session.to_markdown());
        Ok(())
    }

    async fn read_transcript(&self, session_name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.transcripts.lock().unwrap().get(session_name).cloned())
    }

    async fn list(&self) -> Result<Vec<DocumentEntry>, StoreError> {
        let documents = self.documents.lock().unwrap();
        Ok(Stage::ALL
            .iter()
            .map(|stage| DocumentEntry {
                stage: *stage,
                name: stage.display_name().to_string(),
                file: stage.file_stem().to_string(),
                exists: documents.contains_key(stage),
                transcript: stage.session_name().map(|_| false),
                has_feedback: false,
            })
            .collect())
    }
}

/// Hands out one shared store and records the locations asked for
#[derive(Default)]
pub struct SharedStores {
    store: Arc<MemoryStore>,
    opened: Mutex<Vec<String>>,
}

impl SharedStores {
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl DocumentStoreFactory for SharedStores {
    fn open(&self, location: &str) -> Arc<dyn DocumentStore> {
        self.opened.lock().unwrap().push(location.to_string());
        self.store.clone()
    }
}

/// Application state backed by offline providers and an in-memory store
pub fn test_state() -> (AppState, Arc<SharedStores>) {
    let executor = ExecuteStageUseCase::new(
        Arc::new(OfflineGateway),
        Arc::new(RolePersonas),
        Arc::new(AcceptAll),
        Arc::new(NoConversationLogger),
        LlmConfig::new(),
        PipelineSettings::default(),
    );
    let stores = Arc::new(SharedStores::default());
    let service = PipelineService::new(
        Arc::new(TaskManager::default()),
        Arc::new(executor),
        stores.clone(),
        Arc::new(StaticCredentials(Credentials::new())),
        "docs/product",
    );
    (AppState::new(service), stores)
}
