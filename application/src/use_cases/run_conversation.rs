//! Run Conversation use case
//!
//! Runs a Q&A session: one questioner interviews one or more respondents.
//! Each exchange is a barrier: the next question is generated only after
//! every respondent has answered (or failed) the current one. Respondents
//! answer concurrently and never see each other's answers.

use crate::config::QuestionStrategy;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::llm_gateway::{LlmGateway, ProviderClient, ProviderError};
use crate::ports::progress::{NoProgress, ProgressNotifier, ProgressSpan};
use crate::use_cases::shared::generate_with_timeout;
use pipeline_domain::{
    AgentPersona, ConversationSession, PromptTemplate, ProviderBinding, QaExchange,
    RespondentAnswer, RespondentEntry, SourceDocument, parse_questions,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors that abort a whole session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("questioner {questioner} failed to generate questions: {source}")]
    QuestionGeneration {
        questioner: String,
        #[source]
        source: ProviderError,
    },

    #[error("session {0} has no respondents")]
    NoRespondents(String),
}

/// A persona taking part in a session
#[derive(Debug, Clone)]
pub struct Participant {
    pub persona: AgentPersona,
    pub binding: ProviderBinding,
    /// Documents only this participant sees when answering
    pub context: String,
}

impl Participant {
    pub fn new(persona: AgentPersona, binding: ProviderBinding) -> Self {
        Self {
            persona,
            binding,
            context: String::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// Input for the RunConversation use case
#[derive(Debug, Clone)]
pub struct RunConversationInput {
    pub name: String,
    pub questioner: Participant,
    pub respondents: Vec<Participant>,
    /// Labelled documents the questioner reads before asking
    pub sources: Vec<(String, String)>,
    pub question_count: usize,
    pub strategy: QuestionStrategy,
}

impl RunConversationInput {
    pub fn new(name: impl Into<String>, questioner: Participant) -> Self {
        Self {
            name: name.into(),
            questioner,
            respondents: Vec::new(),
            sources: Vec::new(),
            question_count: 5,
            strategy: QuestionStrategy::default(),
        }
    }

    pub fn respondent(mut self, participant: Participant) -> Self {
        self.respondents.push(participant);
        self
    }

    pub fn source(mut self, label: impl Into<String>, body: impl Into<String>) -> Self {
        self.sources.push((label.into(), body.into()));
        self
    }

    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = count;
        self
    }

    pub fn with_strategy(mut self, strategy: QuestionStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// A respondent's client, or the reason it could not be built
type RespondentSlot = (String, String, String, Result<Arc<dyn ProviderClient>, String>);

/// Use case for running a Q&A session
pub struct RunConversationUseCase {
    gateway: Arc<dyn LlmGateway>,
    logger: Arc<dyn ConversationLogger>,
    timeout: Duration,
}

impl RunConversationUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        logger: Arc<dyn ConversationLogger>,
        timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            logger,
            timeout,
        }
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: RunConversationInput,
    ) -> Result<ConversationSession, SessionError> {
        self.execute_with_progress(input, &NoProgress, ProgressSpan::new(0, 100))
            .await
    }

    /// Execute the use case, reporting each finished exchange within `span`
    pub async fn execute_with_progress(
        &self,
        input: RunConversationInput,
        progress: &dyn ProgressNotifier,
        span: ProgressSpan,
    ) -> Result<ConversationSession, SessionError> {
        if input.respondents.is_empty() {
            return Err(SessionError::NoRespondents(input.name));
        }

        let questioner_name = input.questioner.persona.name().to_string();
        let questioner = self
            .gateway
            .client(&input.questioner.binding)
            .map_err(|source| SessionError::QuestionGeneration {
                questioner: questioner_name.clone(),
                source,
            })?;

        let respondents: Vec<RespondentSlot> = input
            .respondents
            .iter()
            .map(|p| {
                let client = self.gateway.client(&p.binding).map_err(|e| e.to_string());
                (
                    p.persona.name().to_string(),
                    p.persona.context().to_string(),
                    p.context.clone(),
                    client,
                )
            })
            .collect();

        let mut session = ConversationSession::new(
            input.name.clone(),
            questioner_name.clone(),
            respondents.iter().map(|(name, ..)| name.clone()).collect(),
        );

        info!(
            session = %input.name,
            questioner = %questioner_name,
            respondents = respondents.len(),
            questions = input.question_count,
            strategy = %input.strategy,
            "Starting Q&A session"
        );
        self.logger.log(ConversationEvent::new(
            "qa_session_start",
            json!({
                "session": input.name,
                "questioner": questioner_name,
                "respondents": session.respondents(),
                "question_count": input.question_count,
                "strategy": input.strategy.as_str(),
            }),
        ));
        progress.on_progress(span.at(0, input.question_count), "Starting Q&A session");

        let sources: Vec<SourceDocument<'_>> = input
            .sources
            .iter()
            .map(|(label, body)| SourceDocument::new(label, body))
            .collect();

        match input.strategy {
            QuestionStrategy::Batch => {
                let questions = self
                    .ask_batch(&*questioner, &input, &sources)
                    .await?;
                for question in questions {
                    self.run_exchange(&mut session, question, &respondents).await;
                    progress.on_progress(
                        span.at(session.len(), input.question_count),
                        &format!("Q&A exchange {} complete", session.len()),
                    );
                }
            }
            QuestionStrategy::Iterative => {
                for index in 1..=input.question_count {
                    let Some(question) = self
                        .ask_next(&*questioner, &input, &sources, &session, index)
                        .await?
                    else {
                        warn!(
                            session = %input.name,
                            "Questioner produced no question at {}/{}, ending session early",
                            index,
                            input.question_count
                        );
                        break;
                    };
                    self.run_exchange(&mut session, question, &respondents).await;
                    progress.on_progress(
                        span.at(session.len(), input.question_count),
                        &format!("Q&A exchange {} complete", session.len()),
                    );
                }
            }
        }

        if session.len() < input.question_count {
            warn!(
                session = %input.name,
                "Session finished with {} of {} requested questions",
                session.len(),
                input.question_count
            );
        }

        self.logger.log(ConversationEvent::new(
            "qa_session_complete",
            json!({
                "session": input.name,
                "exchanges": session.len(),
                "failed_answers": session.exchanges().iter().map(QaExchange::failure_count).sum::<usize>(),
            }),
        ));
        info!(session = %input.name, exchanges = session.len(), "Q&A session complete");

        Ok(session)
    }

    /// Batch strategy: one call, numbered list, truncated to the requested count
    async fn ask_batch(
        &self,
        questioner: &dyn ProviderClient,
        input: &RunConversationInput,
        sources: &[SourceDocument<'_>],
    ) -> Result<Vec<String>, SessionError> {
        if input.question_count == 0 {
            return Ok(Vec::new());
        }

        let prompt = PromptTemplate::question_batch(input.question_count, sources);
        let raw = self
            .ask_questioner(questioner, input, &prompt)
            .await?;

        let mut questions = parse_questions(&questioner.normalize(&raw));
        questions.truncate(input.question_count);
        debug!(session = %input.name, "Parsed {} questions", questions.len());
        Ok(questions)
    }

    /// Iterative strategy: one call per question, seeing the transcript so far
    async fn ask_next(
        &self,
        questioner: &dyn ProviderClient,
        input: &RunConversationInput,
        sources: &[SourceDocument<'_>],
        session: &ConversationSession,
        index: usize,
    ) -> Result<Option<String>, SessionError> {
        let transcript = (!session.is_empty()).then(|| session.folded_context());
        let prompt =
            PromptTemplate::next_question(index, input.question_count, sources, transcript.as_deref());
        let raw = self
            .ask_questioner(questioner, input, &prompt)
            .await?;

        Ok(parse_questions(&questioner.normalize(&raw)).into_iter().next())
    }

    async fn ask_questioner(
        &self,
        questioner: &dyn ProviderClient,
        input: &RunConversationInput,
        prompt: &str,
    ) -> Result<String, SessionError> {
        generate_with_timeout(
            questioner,
            prompt,
            input.questioner.persona.context(),
            self.timeout,
        )
        .await
        .map_err(|source| {
            warn!(session = %input.name, "Questioner failed: {}", source);
            SessionError::QuestionGeneration {
                questioner: input.questioner.persona.name().to_string(),
                source,
            }
        })
    }

    /// Ask every respondent concurrently and append the finished exchange
    async fn run_exchange(
        &self,
        session: &mut ConversationSession,
        question: String,
        respondents: &[RespondentSlot],
    ) {
        let index = session.len() + 1;
        self.logger.log(ConversationEvent::new(
            "qa_question",
            json!({
                "session": session.name(),
                "index": index,
                "questioner": session.questioner(),
                "question": question,
            }),
        ));

        // Placeholders are overwritten by position; a panicked task leaves its own
        let mut entries: Vec<RespondentEntry> = respondents
            .iter()
            .map(|(name, ..)| RespondentEntry::failed(name.clone(), "respondent task aborted"))
            .collect();

        let mut join_set = JoinSet::new();

        for (slot, (name, persona_context, own_context, client)) in respondents.iter().enumerate()
        {
            let client = match client {
                Ok(client) => Arc::clone(client),
                Err(e) => {
                    entries[slot] = RespondentEntry::failed(name.clone(), e.clone());
                    continue;
                }
            };
            let prompt = PromptTemplate::answer(own_context, &question);
            let system = persona_context.clone();
            let timeout = self.timeout;

            join_set.spawn(async move {
                let result = generate_with_timeout(&*client, &prompt, &system, timeout).await;
                (slot, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((slot, Ok(answer))) => {
                    let name = &respondents[slot].0;
                    entries[slot] = RespondentEntry::answered(name.clone(), answer.trim());
                }
                Ok((slot, Err(e))) => {
                    let name = &respondents[slot].0;
                    warn!(session = %session.name(), respondent = %name, "Respondent failed: {}", e);
                    entries[slot] = RespondentEntry::failed(name.clone(), e.to_string());
                }
                Err(e) => {
                    warn!("Respondent task join error: {}", e);
                }
            }
        }

        for entry in &entries {
            let event = match &entry.outcome {
                RespondentAnswer::Answer(answer) => ConversationEvent::new(
                    "qa_answer",
                    json!({
                        "session": session.name(),
                        "index": index,
                        "respondent": entry.respondent,
                        "answer": answer,
                    }),
                ),
                RespondentAnswer::Error(error) => ConversationEvent::new(
                    "qa_error",
                    json!({
                        "session": session.name(),
                        "index": index,
                        "respondent": entry.respondent,
                        "error": error,
                    }),
                ),
            };
            self.logger.log(event);
        }

        let exchange = QaExchange::new(question, entries);
        if exchange.all_failed() {
            warn!(
                session = %session.name(),
                "Every respondent failed on question {}, continuing",
                index
            );
        }
        session.push(exchange);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::conversation_logger::MemoryConversationLogger;
    use crate::testing::{MockGateway, RecordingProgress, ScriptedClient};
    use pipeline_domain::{ProviderKind, Role};

    fn participant(role: Role) -> Participant {
        Participant::new(
            AgentPersona::new(role, format!("You are the {}.", role.display_name())),
            ProviderBinding::new(role, ProviderKind::Gemini, "test-model", "GEMINI_API_KEY", "k"),
        )
    }

    fn use_case(gateway: MockGateway) -> (RunConversationUseCase, Arc<MockGateway>) {
        let gateway = Arc::new(gateway);
        let use_case = RunConversationUseCase::new(
            gateway.clone(),
            Arc::new(MemoryConversationLogger::new()),
            Duration::from_secs(30),
        );
        (use_case, gateway)
    }

    fn design_input(count: usize) -> RunConversationInput {
        RunConversationInput::new("design-qa", participant(Role::Designer))
            .respondent(participant(Role::Strategist).with_context("BRD: clinic booking"))
            .respondent(participant(Role::ProductOwner).with_context("Backlog: empty"))
            .source("Requirements", "{\"title\": \"Clinic Booking\"}")
            .with_question_count(count)
    }

    fn three_questions() -> ScriptedClient {
        ScriptedClient::new(Role::Designer)
            .reply_ok("1. Who books appointments?")
            .reply_ok("Question: Is there a mobile app?")
            .reply_ok("- What about reminders?")
    }

    fn echo(name: &'static str) -> impl Fn(&str) -> Result<String, ProviderError> {
        move |prompt: &str| {
            let question = prompt.rsplit("Question: ").next().unwrap_or_default();
            Ok(format!("  {} on {}  ", name, question))
        }
    }

    #[tokio::test]
    async fn test_three_question_session() {
        let gateway = MockGateway::new()
            .with(three_questions())
            .with(ScriptedClient::new(Role::Strategist).respond_with(echo("strategist")))
            .with(ScriptedClient::new(Role::ProductOwner).respond_with(echo("po")));
        let (use_case, _) = use_case(gateway);

        let session = use_case.execute(design_input(3)).await.unwrap();

        assert_eq!(session.len(), 3);
        let questions: Vec<_> = session.exchanges().iter().map(|e| e.question()).collect();
        assert_eq!(
            questions,
            vec![
                "Who books appointments?",
                "Is there a mobile app?",
                "What about reminders?",
            ]
        );
        for exchange in session.exchanges() {
            assert_eq!(exchange.entries().len(), 2);
            assert_eq!(exchange.entries()[0].respondent, "Product Strategist");
            assert_eq!(exchange.entries()[1].respondent, "Product Owner");
        }
        assert_eq!(
            session.exchanges()[0].entries()[0].outcome,
            RespondentAnswer::Answer("strategist on Who books appointments?".into())
        );
    }

    #[tokio::test]
    async fn test_respondent_failure_becomes_placeholder() {
        let failing_po = ScriptedClient::new(Role::ProductOwner).respond_with(|prompt| {
            if prompt.contains("mobile app") {
                Err(ProviderError::Server {
                    provider: ProviderKind::Gemini,
                    status: 500,
                    message: "boom".into(),
                })
            } else {
                Ok("fine".into())
            }
        });
        let gateway = MockGateway::new()
            .with(three_questions())
            .with(ScriptedClient::new(Role::Strategist).respond_with(echo("strategist")))
            .with(failing_po);
        let (use_case, _) = use_case(gateway);

        let session = use_case.execute(design_input(3)).await.unwrap();

        assert_eq!(session.len(), 3);
        let second = &session.exchanges()[1];
        assert!(second.entry("Product Strategist").unwrap().answer().is_some());
        assert!(second.entry("Product Owner").unwrap().is_error());
        assert_eq!(session.exchanges()[0].failure_count(), 0);
        assert_eq!(session.exchanges()[2].failure_count(), 0);
        assert!(session.to_markdown().contains("_[no answer:"));
    }

    #[tokio::test]
    async fn test_questioner_failure_aborts_session() {
        let gateway = MockGateway::new()
            .with(ScriptedClient::new(Role::Designer).reply_err(ProviderError::Auth {
                provider: ProviderKind::Gemini,
                message: "invalid key".into(),
            }))
            .with(ScriptedClient::new(Role::Strategist).respond_with(echo("strategist")))
            .with(ScriptedClient::new(Role::ProductOwner).respond_with(echo("po")));
        let (use_case, gateway) = use_case(gateway);

        let err = use_case.execute(design_input(3)).await.unwrap_err();

        assert!(matches!(err, SessionError::QuestionGeneration { .. }));
        assert_eq!(gateway.client_for(Role::Strategist).call_count(), 0);
        assert_eq!(gateway.client_for(Role::ProductOwner).call_count(), 0);
    }

    #[tokio::test]
    async fn test_questioner_failure_mid_session_discards_transcript() {
        let questioner = ScriptedClient::new(Role::Designer)
            .reply_ok("1. First?")
            .reply_err(ProviderError::Timeout(Duration::from_secs(30)));
        let gateway = MockGateway::new()
            .with(questioner)
            .with(ScriptedClient::new(Role::Strategist).respond_with(echo("strategist")))
            .with(ScriptedClient::new(Role::ProductOwner).respond_with(echo("po")));
        let (use_case, _) = use_case(gateway);

        let result = use_case.execute(design_input(3)).await;
        assert!(matches!(
            result,
            Err(SessionError::QuestionGeneration {
                source: ProviderError::Timeout(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_next_question_sees_previous_exchange() {
        let gateway = MockGateway::new()
            .with(three_questions())
            .with(ScriptedClient::new(Role::Strategist).respond_with(echo("strategist")))
            .with(ScriptedClient::new(Role::ProductOwner).respond_with(echo("po")));
        let (use_case, gateway) = use_case(gateway);

        use_case.execute(design_input(3)).await.unwrap();

        let prompts = gateway.client_for(Role::Designer).prompts();
        assert_eq!(prompts.len(), 3);
        assert!(!prompts[0].0.contains("Conversation so far"));
        assert!(prompts[1].0.contains("strategist on Who books appointments?"));
        assert_eq!(prompts[0].1, "You are the UX Designer.");
    }

    #[tokio::test]
    async fn test_respondents_see_only_their_own_context() {
        let gateway = MockGateway::new()
            .with(three_questions())
            .with(ScriptedClient::new(Role::Strategist).respond_with(echo("strategist")))
            .with(ScriptedClient::new(Role::ProductOwner).respond_with(echo("po")));
        let (use_case, gateway) = use_case(gateway);

        use_case.execute(design_input(3)).await.unwrap();

        let po_prompts = gateway.client_for(Role::ProductOwner).prompts();
        assert_eq!(po_prompts.len(), 3);
        for (prompt, system) in &po_prompts {
            assert!(prompt.starts_with("Context:\nBacklog: empty"));
            assert!(!prompt.contains("BRD: clinic booking"));
            assert!(!prompt.contains("strategist on"));
            assert_eq!(system, "You are the Product Owner.");
        }
    }

    #[tokio::test]
    async fn test_batch_strategy_truncates_to_count() {
        let questioner = ScriptedClient::new(Role::Designer)
            .reply_ok("```\n1. One?\n2. Two?\n3. Three?\n4. Four?\n5. Five?\n```");
        let gateway = MockGateway::new()
            .with(questioner)
            .with(ScriptedClient::new(Role::Strategist).respond_with(echo("strategist")))
            .with(ScriptedClient::new(Role::ProductOwner).respond_with(echo("po")));
        let (use_case, gateway) = use_case(gateway);

        let session = use_case
            .execute(design_input(3).with_strategy(QuestionStrategy::Batch))
            .await
            .unwrap();

        assert_eq!(session.len(), 3);
        assert_eq!(session.exchanges()[2].question(), "Three?");
        assert_eq!(gateway.client_for(Role::Designer).call_count(), 1);
    }

    #[tokio::test]
    async fn test_fewer_questions_than_requested() {
        let questioner = ScriptedClient::new(Role::Designer).reply_ok("1. Only one?\n2. And two?");
        let gateway = MockGateway::new()
            .with(questioner)
            .with(ScriptedClient::new(Role::Strategist).respond_with(echo("strategist")))
            .with(ScriptedClient::new(Role::ProductOwner).respond_with(echo("po")));
        let (use_case, _) = use_case(gateway);

        let session = use_case
            .execute(design_input(5).with_strategy(QuestionStrategy::Batch))
            .await
            .unwrap();
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn test_iterative_stops_on_empty_question() {
        let questioner = ScriptedClient::new(Role::Designer)
            .reply_ok("Who pays?")
            .reply_ok("   \n");
        let gateway = MockGateway::new()
            .with(questioner)
            .with(ScriptedClient::new(Role::Strategist).respond_with(echo("strategist")))
            .with(ScriptedClient::new(Role::ProductOwner).respond_with(echo("po")));
        let (use_case, gateway) = use_case(gateway);

        let session = use_case.execute(design_input(4)).await.unwrap();
        assert_eq!(session.len(), 1);
        assert_eq!(gateway.client_for(Role::Designer).call_count(), 2);
    }

    #[tokio::test]
    async fn test_every_respondent_failing_still_completes() {
        let down = |_: &str| Err(ProviderError::Timeout(Duration::from_secs(30)));
        let gateway = MockGateway::new()
            .with(three_questions())
            .with(ScriptedClient::new(Role::Strategist).respond_with(down))
            .with(ScriptedClient::new(Role::ProductOwner).respond_with(down));
        let (use_case, _) = use_case(gateway);

        let session = use_case.execute(design_input(3)).await.unwrap();
        assert_eq!(session.len(), 3);
        assert!(session.exchanges().iter().all(QaExchange::all_failed));
    }

    #[tokio::test]
    async fn test_missing_respondent_client_is_a_placeholder() {
        let gateway = MockGateway::new()
            .with(three_questions())
            .with(ScriptedClient::new(Role::Strategist).respond_with(echo("strategist")));
        let (use_case, _) = use_case(gateway);

        let session = use_case.execute(design_input(3)).await.unwrap();
        for exchange in session.exchanges() {
            assert!(exchange.entry("Product Owner").unwrap().is_error());
            assert!(exchange.entry("Product Strategist").unwrap().answer().is_some());
        }
    }

    #[tokio::test]
    async fn test_no_respondents_is_rejected() {
        let (use_case, _) = use_case(MockGateway::new().with(three_questions()));
        let input = RunConversationInput::new("design-qa", participant(Role::Designer));
        let err = use_case.execute(input).await.unwrap_err();
        assert_eq!(err, SessionError::NoRespondents("design-qa".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_respondents_answer_concurrently() {
        let gateway = MockGateway::new()
            .with(ScriptedClient::new(Role::Designer).reply_ok("Only question?"))
            .with(
                ScriptedClient::new(Role::Strategist)
                    .with_delay(Duration::from_secs(10))
                    .respond_with(echo("strategist")),
            )
            .with(
                ScriptedClient::new(Role::ProductOwner)
                    .with_delay(Duration::from_secs(10))
                    .respond_with(echo("po")),
            );
        let (use_case, _) = use_case(gateway);

        let started = tokio::time::Instant::now();
        let session = use_case.execute(design_input(1)).await.unwrap();

        assert_eq!(session.len(), 1);
        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_progress_and_log_events() {
        let logger = Arc::new(MemoryConversationLogger::new());
        let gateway = Arc::new(
            MockGateway::new()
                .with(three_questions())
                .with(ScriptedClient::new(Role::Strategist).respond_with(echo("strategist")))
                .with(ScriptedClient::new(Role::ProductOwner).respond_with(|_| {
                    Err(ProviderError::Timeout(Duration::from_secs(1)))
                })),
        );
        let use_case =
            RunConversationUseCase::new(gateway, logger.clone(), Duration::from_secs(30));
        let progress = RecordingProgress::default();

        use_case
            .execute_with_progress(design_input(3), &progress, ProgressSpan::new(20, 60))
            .await
            .unwrap();

        assert_eq!(progress.percents(), vec![20, 33, 46, 60]);
        assert_eq!(logger.payloads("qa_question").len(), 3);
        assert_eq!(logger.payloads("qa_answer").len(), 3);
        assert_eq!(logger.payloads("qa_error").len(), 3);
        let types = logger.event_types();
        assert_eq!(types.first().map(String::as_str), Some("qa_session_start"));
        assert_eq!(types.last().map(String::as_str), Some("qa_session_complete"));
    }
}
