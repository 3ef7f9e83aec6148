//! Prompt domain
//!
//! Templates for question generation, respondent answers, document
//! generation and requirements refinement.

mod template;

pub use template::{PromptTemplate, SourceDocument};
