//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod conversation_logger;
pub mod credentials;
pub mod document_store;
pub mod llm_gateway;
pub mod persona_store;
pub mod progress;
pub mod schema_validator;
