//! `[server]`, `[paths]` and `[logging]` sections

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Address the HTTP API listens on
    pub bind: String,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePathsConfig {
    /// Where documents, transcripts and feedback live unless a request says otherwise
    pub output_dir: PathBuf,
    /// Directory of `<name>.toml` persona files
    pub personas_dir: PathBuf,
}

impl Default for FilePathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("docs/product"),
            personas_dir: PathBuf::from("personas"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for the daily rolling server log (disabled when unset)
    pub dir: Option<PathBuf>,
    /// JSONL file receiving Q&A session events (disabled when unset)
    pub conversation_log: Option<PathBuf>,
}
