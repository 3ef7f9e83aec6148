//! Presentation layer for product-pipeline
//!
//! This crate contains CLI definitions, console progress and output
//! formatting, and the HTTP/WebSocket API.

pub mod cli;
pub mod output;
pub mod progress;
pub mod server;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat, RunArgs};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{NoProgressView, ProgressReporter, ProgressView, SimpleProgress, follow};
pub use server::{AppState, router, serve};
