//! Pipeline service
//!
//! Entry point used by both the HTTP API and the CLI: validates a request,
//! registers a task and runs the stage in the background.

use crate::ports::credentials::CredentialSource;
use crate::ports::document_store::DocumentStoreFactory;
use crate::tasks::{TaskManager, TaskProgress};
use crate::use_cases::execute_stage::{ExecuteStageUseCase, StageInput};
use pipeline_domain::{Credentials, PersonaSelection, ProviderOverride, Role, Stage, Task, TaskEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};

/// Everything a caller can specify for one stage run
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    pub stage: Stage,
    pub vision: Option<String>,
    /// Output location; the service default when absent
    pub output_dir: Option<String>,
    pub overrides: HashMap<Role, ProviderOverride>,
    /// Credential values keyed by reference, layered over the environment
    pub credentials: HashMap<String, String>,
    pub personas: PersonaSelection,
    pub feedback: Option<String>,
    pub question_count: Option<usize>,
}

impl ExecuteRequest {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            vision: None,
            output_dir: None,
            overrides: HashMap::new(),
            credentials: HashMap::new(),
            personas: PersonaSelection::default(),
            feedback: None,
            question_count: None,
        }
    }

    pub fn with_vision(mut self, vision: impl Into<String>) -> Self {
        self.vision = Some(vision.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

pub struct PipelineService {
    tasks: Arc<TaskManager>,
    executor: Arc<ExecuteStageUseCase>,
    stores: Arc<dyn DocumentStoreFactory>,
    credentials: Arc<dyn CredentialSource>,
    default_output_dir: String,
}

impl PipelineService {
    pub fn new(
        tasks: Arc<TaskManager>,
        executor: Arc<ExecuteStageUseCase>,
        stores: Arc<dyn DocumentStoreFactory>,
        credentials: Arc<dyn CredentialSource>,
        default_output_dir: impl Into<String>,
    ) -> Self {
        Self {
            tasks,
            executor,
            stores,
            credentials,
            default_output_dir: default_output_dir.into(),
        }
    }

    pub fn tasks(&self) -> &Arc<TaskManager> {
        &self.tasks
    }

    pub fn stores(&self) -> &Arc<dyn DocumentStoreFactory> {
        &self.stores
    }

    pub fn default_output_dir(&self) -> &str {
        &self.default_output_dir
    }

    /// Create a task and start it in the background; returns the pending snapshot.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, request: ExecuteRequest) -> Task {
        let task = self.tasks.create(request.stage);
        let id = task.id().clone();

        let location = request
            .output_dir
            .clone()
            .unwrap_or_else(|| self.default_output_dir.clone());
        let store = self.stores.open(&location);
        let credentials = self
            .credentials
            .snapshot()
            .layered(&Credentials::from_pairs(request.credentials.clone()));

        let input = StageInput {
            stage: request.stage,
            vision: request.vision,
            overrides: request.overrides,
            personas: request.personas,
            feedback: request.feedback,
            question_count: request.question_count,
        };

        let tasks = Arc::clone(&self.tasks);
        let executor = Arc::clone(&self.executor);
        let span = info_span!("task", task_id = %id, stage = %request.stage);

        tokio::spawn(
            async move {
                let stage = input.stage;
                if let Err(e) =
                    tasks.transition(&id, TaskEvent::start(format!("Running {} stage", stage)))
                {
                    warn!("Task could not be started: {}", e);
                    return;
                }

                let progress = TaskProgress::new(Arc::clone(&tasks), id.clone());
                let result = executor
                    .execute(input, store, &credentials, &progress)
                    .await;

                let event = match result {
                    Ok(outcome) => {
                        info!("Stage completed");
                        match serde_json::to_value(&outcome) {
                            Ok(value) => TaskEvent::complete(
                                format!("{} generated", stage.display_name()),
                                value,
                            ),
                            Err(e) => TaskEvent::fail(format!("could not encode result: {}", e)),
                        }
                    }
                    Err(e) => {
                        error!("Stage failed: {}", e);
                        TaskEvent::fail(e.to_string())
                    }
                };
                if let Err(e) = tasks.transition(&id, event) {
                    warn!("Could not record task outcome: {}", e);
                }
            }
            .instrument(span),
        );

        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineSettings;
    use crate::ports::conversation_logger::NoConversationLogger;
    use crate::ports::credentials::StaticCredentials;
    use crate::ports::document_store::DocumentStore;
    use crate::testing::{FixedPersonas, JsonObjectValidator, MemoryStore, MockGateway, ScriptedClient};
    use pipeline_domain::{LlmConfig, ProgressEventKind, TaskStatus};
    use std::time::Duration;

    struct SharedStore(Arc<MemoryStore>);

    impl DocumentStoreFactory for SharedStore {
        fn open(&self, _location: &str) -> Arc<dyn DocumentStore> {
            self.0.clone()
        }
    }

    fn service(gateway: MockGateway, store: Arc<MemoryStore>, credentials: Credentials) -> PipelineService {
        let executor = ExecuteStageUseCase::new(
            Arc::new(gateway),
            Arc::new(FixedPersonas),
            Arc::new(JsonObjectValidator),
            Arc::new(NoConversationLogger),
            LlmConfig::new(),
            PipelineSettings::default().with_question_count(1),
        );
        PipelineService::new(
            Arc::new(TaskManager::default()),
            Arc::new(executor),
            Arc::new(SharedStore(store)),
            Arc::new(StaticCredentials(credentials)),
            "docs/product",
        )
    }

    async fn wait_for_terminal(service: &PipelineService, task: &Task) -> Task {
        let mut watch = service.tasks().watch(task.id()).unwrap();
        if let Some(updates) = watch.updates.as_mut() {
            while let Some(event) = updates.next().await {
                if event.is_terminal() {
                    break;
                }
            }
        }
        service.tasks().get(task.id()).unwrap()
    }

    #[tokio::test]
    async fn test_submit_returns_pending_and_completes() {
        let gateway = MockGateway::new().with(
            ScriptedClient::new(Role::Strategist)
                .with_delay(Duration::from_millis(10))
                .reply_ok(r#"{"title": "t", "description": "d", "objectives": []}"#),
        );
        let store = Arc::new(MemoryStore::new());
        let service = service(
            gateway,
            store.clone(),
            Credentials::new().with("GEMINI_API_KEY", "k"),
        );

        let task = service.submit(ExecuteRequest::new(Stage::Requirements).with_vision("An app"));
        assert_eq!(task.status(), TaskStatus::Pending);

        let finished = wait_for_terminal(&service, &task).await;
        assert_eq!(finished.status(), TaskStatus::Completed);
        assert_eq!(finished.progress(), 100);
        assert_eq!(finished.result().unwrap()["stage"], "requirements");
        assert!(store.document(Stage::Requirements).is_some());
    }

    #[tokio::test]
    async fn test_request_credentials_layer_over_source() {
        let gateway = MockGateway::new().with(
            ScriptedClient::new(Role::Strategist)
                .reply_ok(r#"{"title": "t", "description": "d", "objectives": []}"#),
        );
        let service = service(gateway, Arc::new(MemoryStore::new()), Credentials::new());

        let mut request = ExecuteRequest::new(Stage::Requirements).with_vision("An app");
        request
            .credentials
            .insert("GEMINI_API_KEY".into(), "from-request".into());
        let task = service.submit(request);

        let finished = wait_for_terminal(&service, &task).await;
        assert_eq!(finished.status(), TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_failure_is_terminal_with_message() {
        let service = service(
            MockGateway::new(),
            Arc::new(MemoryStore::new()),
            Credentials::new(),
        );

        let task = service.submit(ExecuteRequest::new(Stage::Requirements).with_vision("An app"));
        let finished = wait_for_terminal(&service, &task).await;

        assert_eq!(finished.status(), TaskStatus::Failed);
        assert!(finished.error().unwrap().contains("GEMINI_API_KEY"));
        assert_eq!(
            finished.terminal_event().unwrap().kind,
            ProgressEventKind::Error
        );
    }

    #[tokio::test]
    async fn test_outcome_after_external_termination_is_dropped() {
        let gateway = MockGateway::new().with(
            ScriptedClient::new(Role::Strategist)
                .with_delay(Duration::from_millis(50))
                .reply_ok(r#"{"title": "t", "description": "d", "objectives": []}"#),
        );
        let service = service(
            gateway,
            Arc::new(MemoryStore::new()),
            Credentials::new().with("GEMINI_API_KEY", "k"),
        );

        let task = service.submit(ExecuteRequest::new(Stage::Requirements).with_vision("An app"));
        while service.tasks().get(task.id()).unwrap().status() == TaskStatus::Pending {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        service
            .tasks()
            .transition(task.id(), TaskEvent::fail("cancelled by operator"))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        let finished = service.tasks().get(task.id()).unwrap();
        assert_eq!(finished.status(), TaskStatus::Failed);
        assert_eq!(finished.error(), Some("cancelled by operator"));
    }

    #[tokio::test]
    async fn test_two_stages_run_concurrently() {
        let gateway = MockGateway::new()
            .with(
                ScriptedClient::new(Role::Strategist)
                    .with_delay(Duration::from_millis(20))
                    .respond_with(|prompt| {
                        if prompt.contains("Question:") {
                            Ok("An answer".into())
                        } else {
                            Ok(r#"{"title": "t", "description": "d", "objectives": []}"#.into())
                        }
                    }),
            )
            .with(
                ScriptedClient::new(Role::Designer)
                    .respond_with(|prompt| {
                        if prompt.contains("Respond with ONLY the question") {
                            Ok("Which platform?".into())
                        } else {
                            Ok(r#"{"summary": "s", "screens": []}"#.into())
                        }
                    }),
            );
        let store = Arc::new(MemoryStore::new().with_document(
            Stage::Requirements,
            serde_json::json!({"title": "existing", "description": "d", "objectives": []}),
        ));
        let service = service(
            gateway,
            store.clone(),
            Credentials::new().with("GEMINI_API_KEY", "k"),
        );

        let first = service.submit(ExecuteRequest::new(Stage::Requirements).with_vision("An app"));
        let second = service.submit(ExecuteRequest::new(Stage::Design).with_vision("An app"));
        assert_ne!(first.id(), second.id());

        let first = wait_for_terminal(&service, &first).await;
        let second = wait_for_terminal(&service, &second).await;
        assert_eq!(first.status(), TaskStatus::Completed);
        assert_eq!(second.status(), TaskStatus::Completed);
        assert_eq!(service.tasks().list().len(), 2);
    }
}
