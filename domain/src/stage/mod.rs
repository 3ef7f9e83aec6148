//! Pipeline stages.

use crate::core::error::DomainError;
use crate::persona::Role;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One step of the generation workflow (Value Object)
///
/// Stages run in a fixed order; each one reads the documents produced by
/// the stages before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Business requirements drafted from the product vision
    #[serde(alias = "brd")]
    Requirements,
    /// Design specification derived from the requirements
    Design,
    /// Development tickets derived from requirements and design
    Tickets,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Requirements, Stage::Design, Stage::Tickets];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Requirements => "requirements",
            Stage::Design => "design",
            Stage::Tickets => "tickets",
        }
    }

    /// Short file-name stem used by the document store (`brd`, `design`, `tickets`)
    pub fn file_stem(&self) -> &'static str {
        match self {
            Stage::Requirements => "brd",
            Stage::Design => "design",
            Stage::Tickets => "tickets",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::Requirements => "Business Requirements Document",
            Stage::Design => "Design Specification",
            Stage::Tickets => "Development Tickets",
        }
    }

    /// Persona that authors this stage's document
    pub fn author(&self) -> Role {
        match self {
            Stage::Requirements => Role::Strategist,
            Stage::Design => Role::Designer,
            Stage::Tickets => Role::ProductOwner,
        }
    }

    /// Stages whose documents must exist before this one can run
    pub fn prerequisites(&self) -> &'static [Stage] {
        match self {
            Stage::Requirements => &[],
            Stage::Design => &[Stage::Requirements],
            Stage::Tickets => &[Stage::Requirements, Stage::Design],
        }
    }

    /// Name of the clarifying Q&A session run before drafting, if any
    pub fn session_name(&self) -> Option<&'static str> {
        match self {
            Stage::Requirements => None,
            Stage::Design => Some("design-qa"),
            Stage::Tickets => Some("tickets-qa"),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Stage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "requirements" | "brd" => Ok(Stage::Requirements),
            "design" => Ok(Stage::Design),
            "tickets" => Ok(Stage::Tickets),
            other => Err(DomainError::UnknownStage(other.to_string())),
        }
    }
}
