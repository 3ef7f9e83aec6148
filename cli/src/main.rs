//! CLI entrypoint for Product Pipeline
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use pipeline_application::{
    CheckKeysUseCase, ConversationLogger, ExecuteRequest, ExecuteStageUseCase,
    NoConversationLogger, PipelineService, TaskManager,
};
use pipeline_domain::{ProgressEventKind, Stage};
use pipeline_infrastructure::{
    ConfigLoader, EnvCredentials, FileConfig, FsDocumentStoreFactory, HttpLlmGateway,
    JsonlConversationLogger, RequiredFieldsValidator, TomlPersonaStore,
};
use pipeline_presentation::{
    AppState, Cli, Command, ConsoleFormatter, NoProgressView, OutputFormat, ProgressReporter,
    ProgressView, RunArgs, follow,
};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {e}"))?
    };
    config.validate().context("Invalid configuration")?;

    let log_dir = match cli.command {
        Command::Serve { .. } => config.logging.dir.as_deref(),
        _ => None,
    };
    let _guard = init_logging(cli.verbose, log_dir);

    info!("Starting Product Pipeline");

    match cli.command {
        Command::ShowConfig => {
            show_config(&config, cli.config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Serve { bind } => {
            let service = build_service(&config)?;
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            pipeline_presentation::serve(AppState::new(service), &bind)
                .await
                .with_context(|| format!("API server on {bind} failed"))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(args) => {
            let service = build_service(&config)?;
            run_stage(&service, args, cli.quiet).await
        }
        Command::CheckKeys { call } => check_keys(&config, call).await,
    }
}

/// Console logging by verbosity (`RUST_LOG` wins when set), plus a daily
/// rolling file when `log_dir` is given.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "product-pipeline.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

/// Build the pipeline service from configuration
fn build_service(config: &FileConfig) -> Result<PipelineService> {
    let settings = config.pipeline_settings()?;
    let llm = config.llm_config()?;

    // === Dependency Injection ===
    let gateway = HttpLlmGateway::new(config.provider_settings(), settings.retry.timeout)
        .context("Failed to create HTTP client")?;
    let personas = TomlPersonaStore::new(&config.paths.personas_dir);
    let logger: Arc<dyn ConversationLogger> = match config
        .logging
        .conversation_log
        .as_deref()
        .and_then(|path| JsonlConversationLogger::open(path))
    {
        Some(logger) => {
            info!(path = %logger.path().display(), "Recording conversations");
            Arc::new(logger)
        }
        None => Arc::new(NoConversationLogger),
    };

    let executor = ExecuteStageUseCase::new(
        Arc::new(gateway),
        Arc::new(personas),
        Arc::new(RequiredFieldsValidator),
        logger,
        llm,
        settings,
    );

    Ok(PipelineService::new(
        Arc::new(TaskManager::default()),
        Arc::new(executor),
        Arc::new(FsDocumentStoreFactory),
        Arc::new(EnvCredentials),
        config.paths.output_dir.display().to_string(),
    ))
}

/// Run one stage in the foreground and print its outcome
async fn run_stage(service: &PipelineService, args: RunArgs, quiet: bool) -> Result<ExitCode> {
    let vision = match (&args.vision, &args.vision_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read vision from {}", path.display()))?,
        ),
        (None, None) => None,
    }
    .filter(|text| !text.trim().is_empty());

    if args.stage == Stage::Requirements && vision.is_none() {
        bail!("A vision is required for the requirements stage. Use --vision or --vision-file.");
    }

    let mut request = ExecuteRequest::new(args.stage);
    request.vision = vision;
    request.output_dir = args
        .output_dir
        .as_ref()
        .map(|dir| dir.display().to_string());
    request.overrides = args.overrides();
    request.personas = args.persona_selection();
    request.feedback = args.feedback.clone();
    request.question_count = args.questions.map(usize::from);

    if !quiet {
        println!();
        println!("+============================================================+");
        println!("|           Product Pipeline                                 |");
        println!("+============================================================+");
        println!();
        println!("Stage: {}", args.stage.display_name());
        println!();
    }

    let task = service.submit(request);
    let watch = service.tasks().watch(task.id())?;

    let view: Box<dyn ProgressView> = if quiet {
        Box::new(NoProgressView)
    } else {
        Box::new(ProgressReporter::new(args.stage))
    };
    let terminal = follow(watch, view.as_ref()).await;

    match terminal.kind {
        ProgressEventKind::Complete => {
            let result = terminal.result.unwrap_or_default();
            let output = match args.output {
                OutputFormat::Summary => ConsoleFormatter::format(&result),
                OutputFormat::Json => ConsoleFormatter::format_json(&result),
            };
            println!("{}", output);
            Ok(ExitCode::SUCCESS)
        }
        ProgressEventKind::Error => {
            eprintln!("{}", ConsoleFormatter::format_failure(&terminal));
            Ok(ExitCode::FAILURE)
        }
        ProgressEventKind::Progress | ProgressEventKind::Ack => {
            warn!(task_id = %task.id(), "Progress feed closed before the task finished");
            eprintln!("Task {} ended without a result", task.id());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Print the key each role resolves to; fails when any role has no usable key
async fn check_keys(config: &FileConfig, call: bool) -> Result<ExitCode> {
    let use_case = CheckKeysUseCase::new(Arc::new(EnvCredentials), config.llm_config()?);

    let statuses = if call {
        let settings = config.pipeline_settings()?;
        let gateway = HttpLlmGateway::new(config.provider_settings(), settings.retry.timeout)
            .context("Failed to create HTTP client")?;
        use_case.check_live(&gateway, settings.retry.timeout).await
    } else {
        use_case.check()
    };

    println!("{}", ConsoleFormatter::format_key_report(&statuses));
    if statuses.iter().all(|s| s.state.is_usable()) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn show_config(config: &FileConfig, config_path: Option<&Path>) -> Result<()> {
    ConfigLoader::print_config_sources(config_path);
    println!();
    println!("Effective configuration:");
    println!();
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}
