//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`] — domain-level parse/validation errors
//! - [`text`] — output normalization

pub mod error;
pub mod text;
