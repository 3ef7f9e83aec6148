//! Personas: the roles that draft documents and take part in Q&A sessions.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// A named role in the planning team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "strategist")]
    Strategist,
    #[serde(rename = "designer")]
    Designer,
    #[serde(rename = "po", alias = "product_owner")]
    ProductOwner,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Strategist, Role::Designer, Role::ProductOwner];

    /// Configuration key (`strategist`, `designer`, `po`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Strategist => "strategist",
            Role::Designer => "designer",
            Role::ProductOwner => "po",
        }
    }

    /// Human-readable name used in transcripts
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Strategist => "Product Strategist",
            Role::Designer => "UX Designer",
            Role::ProductOwner => "Product Owner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "strategist" => Ok(Role::Strategist),
            "designer" => Ok(Role::Designer),
            "po" | "product_owner" => Ok(Role::ProductOwner),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

/// A role together with its generation context (Value Object)
///
/// The context text is opaque to the pipeline: it is loaded by a persona
/// store and passed verbatim as the system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPersona {
    role: Role,
    name: String,
    context: String,
}

impl AgentPersona {
    pub fn new(role: Role, context: impl Into<String>) -> Self {
        Self {
            role,
            name: role.display_name().to_string(),
            context: context.into(),
        }
    }

    /// Override the display name (e.g. a specialised persona variant)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

/// Which persona definition to load for each role
///
/// Roles without an entry use the store's default for that role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonaSelection(HashMap<Role, String>);

impl PersonaSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: Role, persona: impl Into<String>) -> Self {
        self.0.insert(role, persona.into());
        self
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        self.0.get(&role).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("po".parse::<Role>().unwrap(), Role::ProductOwner);
        assert_eq!("product-owner".parse::<Role>().unwrap(), Role::ProductOwner);
        assert_eq!("Designer".parse::<Role>().unwrap(), Role::Designer);
        assert!("cto".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_keys() {
        assert_eq!(serde_json::to_string(&Role::ProductOwner).unwrap(), "\"po\"");
        let selection: PersonaSelection =
            serde_json::from_str(r#"{"designer": "rn_designer"}"#).unwrap();
        assert_eq!(selection.get(Role::Designer), Some("rn_designer"));
        assert_eq!(selection.get(Role::Strategist), None);
    }

    #[test]
    fn test_persona_defaults_to_role_name() {
        let persona = AgentPersona::new(Role::Strategist, "You are a strategist.");
        assert_eq!(persona.name(), "Product Strategist");
        let renamed = persona.with_name("Growth Strategist");
        assert_eq!(renamed.name(), "Growth Strategist");
        assert_eq!(renamed.context(), "You are a strategist.");
    }
}
