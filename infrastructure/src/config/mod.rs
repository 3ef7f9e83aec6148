//! Configuration file loading for product-pipeline
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `PIPELINE_*` environment variables (`__` separates nested keys)
//! 2. `--config <path>` specified file
//! 3. Project root: `./pipeline.toml` or `./.pipeline.toml`
//! 4. Global: `$XDG_CONFIG_HOME/product-pipeline/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileEndpointConfig, FileLoggingConfig, FilePathsConfig,
    FilePipelineConfig, FileProvidersConfig, FileRoleConfig, FileServerConfig,
};
pub use loader::ConfigLoader;
