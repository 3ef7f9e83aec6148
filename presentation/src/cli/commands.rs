//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use pipeline_domain::{PersonaSelection, ProviderKind, ProviderOverride, Role, Stage};
use std::collections::HashMap;
use std::path::PathBuf;

/// Output format for a finished stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Summary of the stage outcome
    #[default]
    Summary,
    /// The generated document as JSON
    Json,
}

/// CLI arguments for product-pipeline
#[derive(Parser, Debug)]
#[command(name = "product-pipeline")]
#[command(author, version, about = "Multi-agent product planning pipeline")]
#[command(long_about = r#"
Product Pipeline turns a product vision into a requirements document, a
design specification and development tickets. Each stage is written by an
agent persona; later stages first hold a Q&A session between personas.

Stages:
1. requirements (brd)  Strategist drafts the requirements from the vision
2. design              Designer questions the strategist, then writes the design
3. tickets             Product owner questions both, then writes the tickets

Configuration files are loaded from (in priority order):
1. PIPELINE_* environment variables
2. --config <path>     Explicit config file
3. ./pipeline.toml     Project-level config
4. ~/.config/product-pipeline/config.toml   Global config

Example:
  product-pipeline run requirements --vision "Online booking for dental clinics"
  product-pipeline run design --provider designer=anthropic --questions 3
  product-pipeline serve --bind 0.0.0.0:8000
  product-pipeline check-keys --call
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP and WebSocket API
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Run one stage in the foreground
    Run(RunArgs),

    /// Show configuration file locations and the effective settings
    ShowConfig,

    /// Report which API key each role would use and whether it is set
    CheckKeys {
        /// Also make one short call per role to confirm the key is accepted
        #[arg(long)]
        call: bool,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Stage to run: requirements (brd), design or tickets
    #[arg(value_parser = parse_stage)]
    pub stage: Stage,

    /// Product vision text (required for the requirements stage)
    #[arg(long, conflicts_with = "vision_file")]
    pub vision: Option<String>,

    /// Read the product vision from a file
    #[arg(long, value_name = "PATH")]
    pub vision_file: Option<PathBuf>,

    /// Output directory (overrides paths.output_dir)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Feedback to apply to this run instead of the stored feedback
    #[arg(long)]
    pub feedback: Option<String>,

    /// Provider for a role (can be specified multiple times)
    #[arg(long = "provider", value_name = "ROLE=PROVIDER", value_parser = parse_provider_assignment)]
    pub providers: Vec<(Role, ProviderKind)>,

    /// Model for a role (can be specified multiple times)
    #[arg(long = "model", value_name = "ROLE=MODEL", value_parser = parse_model_assignment)]
    pub models: Vec<(Role, String)>,

    /// Persona file to use for a role (can be specified multiple times)
    #[arg(long = "persona", value_name = "ROLE=NAME", value_parser = parse_model_assignment)]
    pub personas: Vec<(Role, String)>,

    /// Questions per Q&A session (overrides pipeline.question_count)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub questions: Option<u16>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    pub output: OutputFormat,
}

impl RunArgs {
    /// Per-role provider overrides from `--provider` and `--model`
    pub fn overrides(&self) -> HashMap<Role, ProviderOverride> {
        let mut overrides: HashMap<Role, ProviderOverride> = HashMap::new();
        for (role, provider) in &self.providers {
            overrides.entry(*role).or_default().provider = Some(*provider);
        }
        for (role, model) in &self.models {
            overrides.entry(*role).or_default().model = Some(model.clone());
        }
        overrides
    }

    pub fn persona_selection(&self) -> PersonaSelection {
        self.personas
            .iter()
            .fold(PersonaSelection::new(), |selection, (role, name)| {
                selection.with(*role, name.clone())
            })
    }
}

fn parse_stage(value: &str) -> Result<Stage, String> {
    value.parse().map_err(|e| format!("{e}"))
}

fn split_assignment(value: &str) -> Result<(Role, &str), String> {
    let (role, rest) = value
        .split_once('=')
        .ok_or_else(|| format!("expected ROLE=VALUE, got '{value}'"))?;
    let role: Role = role.parse().map_err(|e| format!("{e}"))?;
    let rest = rest.trim();
    if rest.is_empty() {
        return Err(format!("missing value after '{role}='"));
    }
    Ok((role, rest))
}

fn parse_provider_assignment(value: &str) -> Result<(Role, ProviderKind), String> {
    let (role, provider) = split_assignment(value)?;
    let provider = provider.parse().map_err(|e| format!("{e}"))?;
    Ok((role, provider))
}

fn parse_model_assignment(value: &str) -> Result<(Role, String), String> {
    let (role, model) = split_assignment(value)?;
    Ok((role, model.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> RunArgs {
        let mut argv = vec!["product-pipeline", "run"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Run(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_run_with_overrides() {
        let args = run_args(&[
            "design",
            "--provider",
            "designer=claude",
            "--model",
            "designer=claude-opus-4",
            "--model",
            "strategist=gpt-4o",
            "--questions",
            "3",
        ]);

        assert_eq!(args.stage, Stage::Design);
        assert_eq!(args.questions, Some(3));

        let overrides = args.overrides();
        let designer = &overrides[&Role::Designer];
        assert_eq!(designer.provider, Some(ProviderKind::Anthropic));
        assert_eq!(designer.model.as_deref(), Some("claude-opus-4"));
        let strategist = &overrides[&Role::Strategist];
        assert_eq!(strategist.provider, None);
        assert_eq!(strategist.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_brd_alias_and_personas() {
        let args = run_args(&["brd", "--vision", "An app", "--persona", "po=lean_po"]);
        assert_eq!(args.stage, Stage::Requirements);
        assert_eq!(args.vision.as_deref(), Some("An app"));
        assert_eq!(args.persona_selection().get(Role::ProductOwner), Some("lean_po"));
    }

    #[test]
    fn test_bad_assignments_are_rejected() {
        for bad in [
            ["design", "--provider", "designer"],
            ["design", "--provider", "marketing=gemini"],
            ["design", "--provider", "designer=mistral"],
            ["design", "--model", "designer="],
        ] {
            let mut argv = vec!["product-pipeline", "run"];
            argv.extend_from_slice(&bad);
            assert!(Cli::try_parse_from(argv).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_unknown_stage_is_rejected() {
        assert!(Cli::try_parse_from(["product-pipeline", "run", "launch"]).is_err());
    }

    #[test]
    fn test_zero_questions_is_rejected() {
        assert!(
            Cli::try_parse_from(["product-pipeline", "run", "design", "--questions", "0"]).is_err()
        );
    }

    #[test]
    fn test_check_keys_command() {
        let cli = Cli::try_parse_from(["product-pipeline", "check-keys"]).unwrap();
        assert!(matches!(cli.command, Command::CheckKeys { call: false }));

        let cli = Cli::try_parse_from(["product-pipeline", "check-keys", "--call"]).unwrap();
        assert!(matches!(cli.command, Command::CheckKeys { call: true }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["product-pipeline", "serve", "-vv", "--bind", "0.0.0.0:1"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Serve { bind: Some(ref b) } if b == "0.0.0.0:1"));
    }
}
