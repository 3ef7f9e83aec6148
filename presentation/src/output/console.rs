//! Console output formatter for stage results

use colored::Colorize;
use pipeline_application::{KeyState, KeyStatus};
use pipeline_domain::{ProgressEvent, Stage};
use serde::Deserialize;
use serde_json::Value;

/// The parts of a completed task's result payload shown on the console
#[derive(Debug, Deserialize)]
struct OutcomeView {
    stage: Stage,
    location: String,
    document: Value,
    #[serde(default)]
    session: Option<SessionView>,
    #[serde(default)]
    requirements_refined: bool,
    #[serde(default)]
    feedback_applied: bool,
}

#[derive(Debug, Deserialize)]
struct SessionView {
    name: String,
    exchanges: usize,
    failed_answers: usize,
}

/// Formats stage results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the result payload of a completed task
    pub fn format(result: &Value) -> String {
        let Ok(outcome) = serde_json::from_value::<OutcomeView>(result.clone()) else {
            return Self::format_json(result);
        };

        let mut output = String::new();
        output.push_str(&Self::header(outcome.stage.display_name()));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Output:".cyan().bold(),
            outcome.location
        ));

        if let Some(session) = &outcome.session {
            let failures = if session.failed_answers > 0 {
                format!(" ({} unanswered)", session.failed_answers)
                    .yellow()
                    .to_string()
            } else {
                String::new()
            };
            output.push_str(&format!(
                "{} {} - {} questions{}\n",
                "Q&A:".cyan().bold(),
                session.name,
                session.exchanges,
                failures
            ));
        }

        if outcome.requirements_refined {
            output.push_str(&format!(
                "{} requirements updated from the Q&A\n",
                "Refined:".cyan().bold()
            ));
        }
        if outcome.feedback_applied {
            output.push_str(&format!(
                "{} human feedback applied\n",
                "Feedback:".cyan().bold()
            ));
        }

        output.push_str(&Self::section_header("Document"));
        output.push_str(&Self::document_summary(outcome.stage, &outcome.document));
        output.push_str(&Self::footer());
        output
    }

    /// Pretty JSON of the generated document (or the whole payload)
    pub fn format_json(result: &Value) -> String {
        let document = result.get("document").unwrap_or(result);
        serde_json::to_string_pretty(document).unwrap_or_else(|_| "{}".to_string())
    }

    /// One-line report for a failed task
    pub fn format_failure(event: &ProgressEvent) -> String {
        format!(
            "{} {}: {}",
            "Error:".red().bold(),
            event.stage.display_name(),
            event.error.as_deref().unwrap_or(&event.message)
        )
    }

    /// One line per role: provider, key variable and its state
    pub fn format_key_report(statuses: &[KeyStatus]) -> String {
        let mut output = String::new();
        output.push_str(&Self::section_header("API keys"));
        for status in statuses {
            let state = match &status.state {
                KeyState::Present => "present".green().to_string(),
                KeyState::Valid => "valid".green().bold().to_string(),
                KeyState::Missing => "missing".red().to_string(),
                KeyState::Invalid { message } => format!("{} ({})", "invalid".red().bold(), message),
                KeyState::Unverified { message } => {
                    format!("{} ({})", "unverified".yellow(), message)
                }
                KeyState::Misconfigured { message } => {
                    format!("{} ({})", "misconfigured".red(), message)
                }
            };
            output.push_str(&format!(
                "  {:<10} {:<10} {:<20} {}\n",
                status.role.to_string(),
                status.provider.to_string(),
                status.reference.as_deref().unwrap_or("-"),
                state
            ));
        }
        output
    }

    fn document_summary(stage: Stage, document: &Value) -> String {
        let text = |field: &str| document.get(field).and_then(Value::as_str).unwrap_or("");
        let items = |field: &str| {
            document
                .get(field)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
        };

        let mut output = String::new();
        match stage {
            Stage::Requirements => {
                output.push_str(&format!("{}\n\n", text("title").bold()));
                output.push_str(&format!("{}\n", text("description")));
                for objective in items("objectives") {
                    output.push_str(&format!("  * {}\n", objective.as_str().unwrap_or_default()));
                }
            }
            Stage::Design => {
                output.push_str(&format!("{}\n", text("summary")));
                for screen in items("screens") {
                    let name = screen.get("name").and_then(Value::as_str).unwrap_or("?");
                    output.push_str(&format!("  * {}\n", name.yellow()));
                }
            }
            Stage::Tickets => {
                output.push_str(&format!("{} {}\n", "Milestone:".bold(), text("milestone")));
                for ticket in items("tickets") {
                    let field = |f: &str| ticket.get(f).and_then(Value::as_str).unwrap_or("");
                    output.push_str(&format!(
                        "  {} {} {}\n",
                        field("id").yellow(),
                        field("title"),
                        format!("[{}]", field("priority")).dimmed()
                    ));
                }
            }
        }
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_domain::{ProviderKind, Role};
    use serde_json::json;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_design_outcome() {
        plain();
        let result = json!({
            "stage": "design",
            "location": "docs/product",
            "document": {"summary": "Booking flow", "screens": [{"name": "Calendar"}]},
            "session": {"name": "design-qa", "exchanges": 3, "failed_answers": 1},
            "requirements_refined": true,
            "feedback_applied": false
        });

        let text = ConsoleFormatter::format(&result);
        assert!(text.contains("Design Specification"));
        assert!(text.contains("design-qa - 3 questions (1 unanswered)"));
        assert!(text.contains("requirements updated"));
        assert!(!text.contains("feedback applied"));
        assert!(text.contains("* Calendar"));
    }

    #[test]
    fn test_format_tickets_outcome() {
        plain();
        let result = json!({
            "stage": "tickets",
            "location": "out",
            "document": {"milestone": "MVP", "tickets": [{"id": "T-1", "title": "Login", "priority": "high"}]},
            "requirements_refined": false,
            "feedback_applied": true
        });

        let text = ConsoleFormatter::format(&result);
        assert!(text.contains("Milestone: MVP"));
        assert!(text.contains("T-1 Login [high]"));
        assert!(text.contains("human feedback applied"));
    }

    #[test]
    fn test_format_key_report() {
        plain();
        let statuses = vec![
            KeyStatus {
                role: Role::Strategist,
                provider: ProviderKind::Gemini,
                model: Some("gemini-2.5-pro".into()),
                reference: Some("GEMINI_API_KEY".into()),
                state: KeyState::Valid,
            },
            KeyStatus {
                role: Role::Designer,
                provider: ProviderKind::Anthropic,
                model: None,
                reference: Some("ANTHROPIC_API_KEY".into()),
                state: KeyState::Missing,
            },
            KeyStatus {
                role: Role::ProductOwner,
                provider: ProviderKind::OpenAi,
                model: Some("gpt-4o".into()),
                reference: Some("OPENAI_API_KEY".into()),
                state: KeyState::Invalid {
                    message: "bad key".into(),
                },
            },
        ];

        let text = ConsoleFormatter::format_key_report(&statuses);
        let lines: Vec<&str> = text.lines().filter(|l| l.starts_with("  ")).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("GEMINI_API_KEY") && lines[0].ends_with("valid"));
        assert!(lines[1].contains("ANTHROPIC_API_KEY") && lines[1].ends_with("missing"));
        assert!(lines[2].ends_with("invalid (bad key)"));
    }

    #[test]
    fn test_unknown_payload_falls_back_to_json() {
        let text = ConsoleFormatter::format(&json!({"unexpected": true}));
        assert!(text.contains("\"unexpected\": true"));
    }

    #[test]
    fn test_format_json_extracts_document() {
        let text = ConsoleFormatter::format_json(&json!({"document": {"title": "T"}}));
        assert_eq!(text, "{\n  \"title\": \"T\"\n}");
    }
}
