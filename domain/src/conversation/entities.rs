//! Conversation entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One respondent's outcome for a single question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum RespondentAnswer {
    Answer(String),
    /// The respondent's call failed; the session carries on without it
    Error(String),
}

impl RespondentAnswer {
    pub fn is_error(&self) -> bool {
        matches!(self, RespondentAnswer::Error(_))
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            RespondentAnswer::Answer(text) => Some(text),
            RespondentAnswer::Error(_) => None,
        }
    }
}

/// A respondent's name paired with its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondentEntry {
    pub respondent: String,
    pub outcome: RespondentAnswer,
}

impl RespondentEntry {
    pub fn answered(respondent: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            respondent: respondent.into(),
            outcome: RespondentAnswer::Answer(text.into()),
        }
    }

    pub fn failed(respondent: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            respondent: respondent.into(),
            outcome: RespondentAnswer::Error(error.into()),
        }
    }
}

/// One question and every respondent's entry, in respondent order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaExchange {
    question: String,
    entries: Vec<RespondentEntry>,
}

impl QaExchange {
    pub fn new(question: impl Into<String>, entries: Vec<RespondentEntry>) -> Self {
        Self {
            question: question.into(),
            entries,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn entries(&self) -> &[RespondentEntry] {
        &self.entries
    }

    pub fn entry(&self, respondent: &str) -> Option<&RespondentAnswer> {
        self.entries
            .iter()
            .find(|e| e.respondent == respondent)
            .map(|e| &e.outcome)
    }

    pub fn failure_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_error()).count()
    }

    /// Every respondent failed on this question
    pub fn all_failed(&self) -> bool {
        !self.entries.is_empty() && self.failure_count() == self.entries.len()
    }
}

/// A completed (or in-progress) Q&A session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSession {
    name: String,
    questioner: String,
    respondents: Vec<String>,
    exchanges: Vec<QaExchange>,
    created_at: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(
        name: impl Into<String>,
        questioner: impl Into<String>,
        respondents: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            questioner: questioner.into(),
            respondents,
            exchanges: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn questioner(&self) -> &str {
        &self.questioner
    }

    pub fn respondents(&self) -> &[String] {
        &self.respondents
    }

    pub fn exchanges(&self) -> &[QaExchange] {
        &self.exchanges
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn push(&mut self, exchange: QaExchange) {
        self.exchanges.push(exchange);
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Render the transcript as markdown, exchanges top to bottom
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# Q&A Session: {} ↔ {}\n\n*Session: {}*\n*Date: {}*\n",
            self.questioner,
            self.respondents.join(", "),
            self.name,
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        );

        for (i, exchange) in self.exchanges.iter().enumerate() {
            out.push_str(&format!(
                "\n## Question {}\n\n**{} asks:**\n{}\n",
                i + 1,
                self.questioner,
                exchange.question
            ));
            for entry in &exchange.entries {
                let body = match &entry.outcome {
                    RespondentAnswer::Answer(text) => text.clone(),
                    RespondentAnswer::Error(err) => format!("_[no answer: {}]_", err),
                };
                out.push_str(&format!("\n**{} responds:**\n{}\n", entry.respondent, body));
            }
        }

        out
    }

    /// Single context string handed to the next generation step
    pub fn folded_context(&self) -> String {
        self.to_markdown()
    }
}
