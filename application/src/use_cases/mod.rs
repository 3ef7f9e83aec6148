//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod check_keys;
pub mod execute_stage;
pub mod feedback_gate;
pub mod generate_document;
pub mod run_conversation;
pub(crate) mod shared;
