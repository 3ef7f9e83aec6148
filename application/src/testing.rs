//! Hand-written test doubles shared by the use case tests.

use crate::ports::document_store::{DocumentEntry, DocumentStore, StoreError};
use crate::ports::llm_gateway::{LlmGateway, ProviderClient, ProviderError};
use crate::ports::persona_store::{PersonaError, PersonaStore};
use crate::ports::progress::ProgressNotifier;
use crate::ports::schema_validator::SchemaValidator;
use async_trait::async_trait;
use pipeline_domain::{
    AgentPersona, ConversationSession, Document, ProviderBinding, ProviderKind, Role,
    SchemaValidationError, Stage,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = Box<dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync>;

/// Provider client that replays scripted replies and records every prompt
pub struct ScriptedClient {
    binding: ProviderBinding,
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    responder: Option<Responder>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    pub fn new(role: Role) -> Self {
        Self {
            binding: ProviderBinding::new(
                role,
                ProviderKind::Gemini,
                "test-model",
                "GEMINI_API_KEY",
                "test-key",
            ),
            replies: Mutex::new(VecDeque::new()),
            responder: None,
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn reply_ok(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn reply_err(self, error: ProviderError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Compute replies from the prompt instead of a fixed queue
    pub fn respond_with(
        mut self,
        f: impl Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        self.responder = Some(Box::new(f));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// (prompt, system_context) pairs, in call order
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderClient for ScriptedClient {
    fn binding(&self) -> &ProviderBinding {
        &self.binding
    }

    async fn generate(&self, prompt: &str, system_context: &str) -> Result<String, ProviderError> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), system_context.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(responder) = &self.responder {
            return responder(prompt);
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::InvalidResponse {
                    provider: ProviderKind::Gemini,
                    message: "no scripted reply".to_string(),
                })
            })
    }
}

/// Gateway handing out one scripted client per role
#[derive(Default)]
pub struct MockGateway {
    clients: HashMap<Role, Arc<ScriptedClient>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, client: ScriptedClient) -> Self {
        self.clients.insert(client.binding.role(), Arc::new(client));
        self
    }

    pub fn client_for(&self, role: Role) -> Arc<ScriptedClient> {
        Arc::clone(&self.clients[&role])
    }
}

impl LlmGateway for MockGateway {
    fn client(&self, binding: &ProviderBinding) -> Result<Arc<dyn ProviderClient>, ProviderError> {
        self.clients
            .get(&binding.role())
            .map(|c| Arc::clone(c) as Arc<dyn ProviderClient>)
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: binding.provider(),
                message: format!("no client scripted for {}", binding.role()),
            })
    }
}

/// In-memory document store
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<Stage, Document>>,
    feedback: Mutex<HashMap<Stage, String>>,
    transcripts: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, stage: Stage, content: serde_json::Value) -> Self {
        self.documents
            .lock()
            .unwrap()
            .insert(stage, Document::new(stage, content));
        self
    }

    pub fn with_feedback(self, stage: Stage, text: &str) -> Self {
        self.feedback.lock().unwrap().insert(stage, text.to_string());
        self
    }

    pub fn document(&self, stage: Stage) -> Option<Document> {
        self.documents.lock().unwrap().get(&stage).cloned()
    }

    pub fn feedback(&self, stage: Stage) -> Option<String> {
        self.feedback.lock().unwrap().get(&stage).cloned()
    }

    pub fn transcript(&self, name: &str) -> Option<String> {
        self.transcripts.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    async fn read_feedback(&self, stage: Stage) -> Result<Option<String>, StoreError> {
        Ok(self
            .feedback(stage)
            .filter(|text| !text.trim().is_empty()))
    }

    async fn write_feedback(&self, stage: Stage, text: &str) -> Result<(), StoreError> {
        self.feedback.lock().unwrap().insert(stage, text.to_string());
        Ok(())
    }

    async fn remove_feedback(&self, stage: Stage) -> Result<bool, StoreError> {
        Ok(self.feedback.lock().unwrap().remove(&stage).is_some())
    }

    async fn read_document(&self, stage: Stage) -> Result<Option<Document>, StoreError> {
        Ok(self.document(stage))
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
        Ok(self.transcript(session_name))
    }

    async fn list(&self) -> Result<Vec<DocumentEntry>, StoreError> {
        Ok(Stage::ALL
            .iter()
            .map(|stage| DocumentEntry {
                stage: *stage,
                name: stage.display_name().to_string(),
                file: stage.file_stem().to_string(),
                exists: self.document(*stage).is_some(),
                transcript: stage
                    .session_name()
                    .map(|name| self.transcript(name).is_some()),
                has_feedback: self.feedback(*stage).is_some(),
            })
            .collect())
    }
}

/// Personas whose context is derived from the role name
pub struct FixedPersonas;

#[async_trait]
impl PersonaStore for FixedPersonas {
    async fn load_persona(
        &self,
        role: Role,
        name: Option<&str>,
    ) -> Result<AgentPersona, PersonaError> {
        let persona = AgentPersona::new(role, format!("You are the {}.", role.display_name()));
        Ok(match name {
            Some(name) => persona.with_name(name),
            None => persona,
        })
    }
}

/// Accepts any JSON object
pub struct JsonObjectValidator;

impl SchemaValidator for JsonObjectValidator {
    fn validate(&self, stage: Stage, normalized: &str) -> Result<Document, SchemaValidationError> {
        let value: serde_json::Value =
            serde_json::from_str(normalized).map_err(|e| SchemaValidationError::NotJson {
                stage,
                message: e.to_string(),
            })?;
        if !value.is_object() {
            return Err(SchemaValidationError::NotAnObject { stage });
        }
        Ok(Document::new(stage, value))
    }
}

/// Records every milestone
#[derive(Default)]
pub struct RecordingProgress {
    pub updates: Mutex<Vec<(u8, String)>>,
}

impl RecordingProgress {
    pub fn percents(&self) -> Vec<u8> {
        self.updates.lock().unwrap().iter().map(|(p, _)| *p).collect()
    }
}

impl ProgressNotifier for RecordingProgress {
    fn on_progress(&self, percent: u8, message: &str) {
        self.updates
            .lock()
            .unwrap()
            .push((percent, message.to_string()));
    }
}
