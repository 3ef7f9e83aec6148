//! Execute Stage use case
//!
//! Runs one pipeline stage end to end:
//!
//! 1. Resolve a provider binding for every role the stage needs (fail fast)
//! 2. Load personas and prior documents
//! 3. Run the stage's Q&A session, if it has one, and persist the transcript
//! 4. Refine the requirements from the design Q&A (design stage only)
//! 5. Generate, validate and write the stage's document

use crate::config::PipelineSettings;
use crate::ports::conversation_logger::ConversationLogger;
use crate::ports::document_store::{DocumentStore, StoreError};
use crate::ports::llm_gateway::{LlmGateway, ProviderError};
use crate::ports::persona_store::{PersonaError, PersonaStore};
use crate::ports::progress::{ProgressNotifier, ProgressSpan};
use crate::ports::schema_validator::SchemaValidator;
use crate::use_cases::feedback_gate::FeedbackGate;
use crate::use_cases::generate_document::{
    GenerateDocumentUseCase, GenerationError, GenerationRequest,
};
use crate::use_cases::run_conversation::{
    Participant, RunConversationInput, RunConversationUseCase, SessionError,
};
use pipeline_domain::{
    AgentPersona, ConfigurationError, ConversationSession, Credentials, Document, LlmConfig,
    PersonaSelection, ProviderBinding, ProviderOverride, ProviderResolver, QaExchange, Role,
    SchemaValidationError, SourceDocument, Stage,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that fail a stage (and therefore its task)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Persona(#[from] PersonaError),

    #[error("the {stage} stage needs the {missing} document; run that stage first")]
    MissingPriorDocument { stage: Stage, missing: Stage },

    #[error("the {0} stage needs a product vision")]
    MissingVision(Stage),
}

impl From<GenerationError> for PipelineError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::Provider(e) => PipelineError::Provider(e),
            GenerationError::Schema(e) => PipelineError::Schema(e),
        }
    }
}

/// Input for the ExecuteStage use case
#[derive(Debug, Clone)]
pub struct StageInput {
    pub stage: Stage,
    pub vision: Option<String>,
    /// Per-role provider/model overrides for this run
    pub overrides: HashMap<Role, ProviderOverride>,
    pub personas: PersonaSelection,
    /// Feedback supplied with the request; wins over stored feedback
    pub feedback: Option<String>,
    /// Overrides the configured question count
    pub question_count: Option<usize>,
}

impl StageInput {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            vision: None,
            overrides: HashMap::new(),
            personas: PersonaSelection::default(),
            feedback: None,
            question_count: None,
        }
    }

    pub fn with_vision(mut self, vision: impl Into<String>) -> Self {
        self.vision = Some(vision.into());
        self
    }

    pub fn with_override(mut self, role: Role, provider: ProviderOverride) -> Self {
        self.overrides.insert(role, provider);
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = Some(count);
        self
    }
}

/// Summary of the Q&A session a stage ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub name: String,
    pub exchanges: usize,
    pub failed_answers: usize,
}

impl From<&ConversationSession> for SessionSummary {
    fn from(session: &ConversationSession) -> Self {
        Self {
            name: session.name().to_string(),
            exchanges: session.len(),
            failed_answers: session
                .exchanges()
                .iter()
                .map(QaExchange::failure_count)
                .sum(),
        }
    }
}

/// Result payload of a completed stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub location: String,
    pub document: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSummary>,
    pub requirements_refined: bool,
    pub feedback_applied: bool,
}

/// Progress milestones for one stage run
mod milestone {
    pub const INPUTS_LOADED: u8 = 20;
    pub const SESSION_END: u8 = 60;
    pub const REFINING: u8 = 70;
    pub const GENERATING: u8 = 80;
    pub const VALIDATED: u8 = 90;
}

/// Everything resolved before the first provider call
struct Cast {
    bindings: HashMap<Role, ProviderBinding>,
    personas: HashMap<Role, AgentPersona>,
}

impl Cast {
    fn participant(&self, role: Role) -> Participant {
        Participant::new(self.personas[&role].clone(), self.bindings[&role].clone())
    }
}

/// Use case for executing one stage
pub struct ExecuteStageUseCase {
    personas: Arc<dyn PersonaStore>,
    llm: LlmConfig,
    settings: PipelineSettings,
    conversation: RunConversationUseCase,
    generation: GenerateDocumentUseCase,
}

impl ExecuteStageUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        personas: Arc<dyn PersonaStore>,
        validator: Arc<dyn SchemaValidator>,
        logger: Arc<dyn ConversationLogger>,
        llm: LlmConfig,
        settings: PipelineSettings,
    ) -> Self {
        let conversation =
            RunConversationUseCase::new(gateway.clone(), logger, settings.retry.timeout);
        let generation = GenerateDocumentUseCase::new(gateway, validator, settings.retry);
        Self {
            personas,
            llm,
            settings,
            conversation,
            generation,
        }
    }

    /// Roles taking part in a stage; the author comes first
    fn roles(stage: Stage) -> &'static [Role] {
        match stage {
            Stage::Requirements => &[Role::Strategist],
            Stage::Design => &[Role::Designer, Role::Strategist],
            Stage::Tickets => &[Role::ProductOwner, Role::Designer, Role::Strategist],
        }
    }

    pub async fn execute(
        &self,
        input: StageInput,
        store: Arc<dyn DocumentStore>,
        credentials: &Credentials,
        progress: &dyn ProgressNotifier,
    ) -> Result<StageOutcome, PipelineError> {
        let stage = input.stage;
        let cast = self.cast(&input, credentials).await?;

        let mut prior: HashMap<Stage, Document> = HashMap::new();
        for required in stage.prerequisites() {
            let document = store.read_document(*required).await?.ok_or(
                PipelineError::MissingPriorDocument {
                    stage,
                    missing: *required,
                },
            )?;
            prior.insert(*required, document);
        }

        let vision = input.vision.as_deref().filter(|v| !v.trim().is_empty());
        if stage == Stage::Requirements && vision.is_none() {
            return Err(PipelineError::MissingVision(stage));
        }

        let gate = FeedbackGate::new(store.clone()).with_override(input.feedback.clone());
        let feedback_block = gate.maybe_incorporate(stage).await?;
        progress.on_progress(milestone::INPUTS_LOADED, "Inputs loaded");

        let question_count = input
            .question_count
            .unwrap_or(self.settings.question_count);

        let mut session = None;
        let mut requirements_refined = false;

        if let Some(name) = stage.session_name() {
            let conversation = self.session_input(stage, name, &cast, &prior, vision, question_count);
            let finished = self
                .conversation
                .execute_with_progress(
                    conversation,
                    progress,
                    ProgressSpan::new(milestone::INPUTS_LOADED, milestone::SESSION_END),
                )
                .await?;
            store.write_transcript(&finished).await?;
            session = Some(finished);
        }

        if stage == Stage::Design
            && self.settings.refine_requirements
            && let Some(transcript) = session.as_ref().filter(|s| !s.is_empty())
        {
            progress.on_progress(milestone::REFINING, "Refining requirements");
            let current = &prior[&Stage::Requirements];
            let refined = self
                .generation
                .refine_requirements(
                    &cast.personas[&Role::Strategist],
                    &cast.bindings[&Role::Strategist],
                    current,
                    &transcript.folded_context(),
                )
                .await?;
            store.write_document(&refined).await?;
            prior.insert(Stage::Requirements, refined);
            requirements_refined = true;
        }

        progress.on_progress(
            milestone::GENERATING,
            &format!("Generating {}", stage.display_name()),
        );

        let bodies: Vec<(&'static str, String)> = Self::source_bodies(&prior, vision);
        let sources: Vec<SourceDocument<'_>> = bodies
            .iter()
            .map(|(label, body)| SourceDocument::new(label, body))
            .collect();
        let session_context = session.as_ref().map(ConversationSession::folded_context);
        let author = stage.author();

        let document = self
            .generation
            .generate(GenerationRequest {
                stage,
                author: &cast.personas[&author],
                binding: &cast.bindings[&author],
                sources: &sources,
                session_context: session_context.as_deref(),
                feedback_block: feedback_block.as_deref(),
            })
            .await?;
        progress.on_progress(milestone::VALIDATED, "Document validated");

        store.write_document(&document).await?;
        info!(stage = %stage, location = %store.location(), "Stage document written");

        Ok(StageOutcome {
            stage,
            location: store.location(),
            document: document.into_content(),
            session: session.as_ref().map(SessionSummary::from),
            requirements_refined,
            feedback_applied: feedback_block.is_some(),
        })
    }

    /// Resolve bindings for every role first, then load personas
    async fn cast(&self, input: &StageInput, credentials: &Credentials) -> Result<Cast, PipelineError> {
        let roles = Self::roles(input.stage);

        let mut bindings = HashMap::new();
        for role in roles {
            let binding =
                ProviderResolver::resolve(*role, input.overrides.get(role), &self.llm, credentials)?;
            info!(
                role = %role,
                provider = %binding.provider(),
                model = binding.model(),
                "Resolved provider"
            );
            bindings.insert(*role, binding);
        }

        let mut personas = HashMap::new();
        for role in roles {
            let persona = self
                .personas
                .load_persona(*role, input.personas.get(*role))
                .await?;
            personas.insert(*role, persona);
        }

        Ok(Cast { bindings, personas })
    }

    fn session_input(
        &self,
        stage: Stage,
        name: &str,
        cast: &Cast,
        prior: &HashMap<Stage, Document>,
        vision: Option<&str>,
        question_count: usize,
    ) -> RunConversationInput {
        let text = |s: Stage| prior.get(&s).map(Document::to_pretty_json).unwrap_or_default();

        let mut input = match stage {
            Stage::Tickets => RunConversationInput::new(name, cast.participant(Role::ProductOwner))
                .respondent(cast.participant(Role::Designer).with_context(text(Stage::Design)))
                .respondent(
                    cast.participant(Role::Strategist)
                        .with_context(text(Stage::Requirements)),
                ),
            _ => RunConversationInput::new(name, cast.participant(Role::Designer)).respondent(
                cast.participant(Role::Strategist)
                    .with_context(text(Stage::Requirements)),
            ),
        };

        for (label, body) in Self::source_bodies(prior, vision) {
            input = input.source(label, body);
        }
        if vision.is_none() && stage != Stage::Requirements {
            warn!(stage = %stage, "No vision supplied, questions rely on prior documents only");
        }

        input
            .with_question_count(question_count)
            .with_strategy(self.settings.question_strategy)
    }

    fn source_bodies(
        prior: &HashMap<Stage, Document>,
        vision: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut bodies = Vec::new();
        if let Some(vision) = vision {
            bodies.push(("Product vision", vision.to_string()));
        }
        for stage in Stage::ALL {
            if let Some(document) = prior.get(&stage) {
                bodies.push((stage.display_name(), document.to_pretty_json()));
            }
        }
        bodies
    }
}
