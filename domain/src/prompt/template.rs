//! Prompt templates for the planning pipeline

use crate::stage::Stage;

/// A labelled document handed to a prompt as context
#[derive(Debug, Clone, Copy)]
pub struct SourceDocument<'a> {
    pub label: &'a str,
    pub body: &'a str,
}

impl<'a> SourceDocument<'a> {
    pub fn new(label: &'a str, body: &'a str) -> Self {
        Self { label, body }
    }
}

/// Templates for generating prompts at each step
pub struct PromptTemplate;

impl PromptTemplate {
    /// Ask the questioner for a numbered list of clarifying questions
    pub fn question_batch(count: usize, sources: &[SourceDocument<'_>]) -> String {
        format!(
            r#"Please analyze the following documents and generate {count} clarifying questions that would help you better understand the requirements and create a more comprehensive output.

Respond with ONLY a numbered list of questions, one per line.

{}"#,
            Self::render_sources(sources)
        )
    }

    /// Ask the questioner for the next single question, given the exchanges so far
    pub fn next_question(
        index: usize,
        total: usize,
        sources: &[SourceDocument<'_>],
        transcript: Option<&str>,
    ) -> String {
        let mut prompt = Self::render_sources(sources);

        if let Some(transcript) = transcript.filter(|t| !t.trim().is_empty()) {
            prompt.push_str(&format!("\n\nConversation so far:\n{}", transcript));
        }

        prompt.push_str(&format!(
            r#"

You are asking clarifying question {index} of {total}. Do not repeat anything already answered above.
Respond with ONLY the question, on a single line."#
        ));

        prompt
    }

    /// Respondent prompt: own context plus the question, nothing else
    pub fn answer(context: &str, question: &str) -> String {
        if context.trim().is_empty() {
            format!("Question: {}", question)
        } else {
            format!("Context:\n{}\n\nQuestion: {}", context, question)
        }
    }

    /// Draft the document for `stage`
    ///
    /// Feedback goes first so it takes precedence over the standard request.
    pub fn generation(
        stage: Stage,
        sources: &[SourceDocument<'_>],
        session_context: Option<&str>,
        feedback_block: Option<&str>,
    ) -> String {
        let mut prompt = String::new();

        if let Some(block) = feedback_block {
            prompt.push_str(block);
            prompt.push('\n');
        }

        prompt.push_str(&format!(
            "Using the material below, write the {}.\n\n",
            stage.display_name()
        ));
        prompt.push_str(&Self::render_sources(sources));

        if let Some(context) = session_context.filter(|c| !c.trim().is_empty()) {
            prompt.push_str(&format!(
                "\n\nClarifications gathered from the team:\n{}",
                context
            ));
        }

        prompt.push_str("\n\n");
        prompt.push_str(Self::output_contract(stage));
        prompt
    }

    /// Fold a Q&A transcript back into the requirements document
    pub fn refine_requirements(requirements: &str, transcript: &str) -> String {
        format!(
            r#"The requirements document below was discussed with the team. Update it so that it reflects every answer in the conversation. Keep what is still accurate; do not invent scope nobody asked for.

Current requirements:
{requirements}

Conversation:
{transcript}

{}"#,
            Self::output_contract(Stage::Requirements)
        )
    }

    /// JSON shape expected back for each stage
    pub fn output_contract(stage: Stage) -> &'static str {
        match stage {
            Stage::Requirements => {
                r#"Respond with ONLY a JSON object of the form:
{"title": string, "description": string, "objectives": [string]}"#
            }
            Stage::Design => {
                r#"Respond with ONLY a JSON object of the form:
{"summary": string, "screens": [{"name": string, "description": string, "wireframe": string, "components": [{"name": string, "description": string, "code_snippet": string, "notes": string}]}]}"#
            }
            Stage::Tickets => {
                r#"Respond with ONLY a JSON object of the form:
{"milestone": string, "tickets": [{"id": string, "title": string, "description": string, "priority": string, "dependencies": [string], "acceptance_criteria": [string], "complexity": string, "notes": string}]}"#
            }
        }
    }

    fn render_sources(sources: &[SourceDocument<'_>]) -> String {
        sources
            .iter()
            .map(|doc| format!("{}:\n{}", doc.label, doc.body))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
