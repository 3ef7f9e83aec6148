//! Infrastructure layer for product-pipeline
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: HTTP provider clients, the filesystem document
//! store, persona files, schema validation and configuration file loading.

pub mod config;
pub mod credentials;
pub mod logging;
pub mod personas;
pub mod providers;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use credentials::EnvCredentials;
pub use logging::JsonlConversationLogger;
pub use personas::TomlPersonaStore;
pub use providers::HttpLlmGateway;
pub use store::{FsDocumentStore, FsDocumentStoreFactory};
pub use validation::RequiredFieldsValidator;
