//! Resolved provider bindings and the credentials they are built from.

use super::ProviderKind;
use crate::persona::Role;
use serde::Serialize;
use std::collections::HashMap;

/// Credential values keyed by their reference (environment variable name)
///
/// A snapshot built per request: the request's credential map layered over
/// the process environment. Never cached across requests.
#[derive(Clone, Default)]
pub struct Credentials(HashMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn with(mut self, reference: impl Into<String>, secret: impl Into<String>) -> Self {
        self.0.insert(reference.into(), secret.into());
        self
    }

    /// Entries from `overrides` replace entries in `self`
    pub fn layered(mut self, overrides: &Credentials) -> Self {
        for (key, value) in &overrides.0 {
            self.0.insert(key.clone(), value.clone());
        }
        self
    }

    /// Look up a credential; blank values count as missing
    pub fn get(&self, reference: &str) -> Option<&str> {
        self.0
            .get(reference)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.0.keys().collect();
        keys.sort();
        f.debug_struct("Credentials").field("keys", &keys).finish()
    }
}

/// Backend, model and credential resolved for one role on one call
#[derive(Clone, Serialize)]
pub struct ProviderBinding {
    role: Role,
    provider: ProviderKind,
    model: String,
    credential_ref: String,
    #[serde(skip)]
    secret: String,
}

impl ProviderBinding {
    pub fn new(
        role: Role,
        provider: ProviderKind,
        model: impl Into<String>,
        credential_ref: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            role,
            provider,
            model: model.into(),
            credential_ref: credential_ref.into(),
            secret: secret.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Name of the variable the secret was read from
    pub fn credential_ref(&self) -> &str {
        &self.credential_ref
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBinding")
            .field("role", &self.role)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("credential_ref", &self.credential_ref)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_credentials_are_missing() {
        let creds = Credentials::new().with("GEMINI_API_KEY", "   ");
        assert!(creds.get("GEMINI_API_KEY").is_none());
    }

    #[test]
    fn test_layered_overrides_win() {
        let env = Credentials::from_pairs([("OPENAI_API_KEY", "env"), ("GEMINI_API_KEY", "g")]);
        let request = Credentials::new().with("OPENAI_API_KEY", "request");
        let merged = env.layered(&request);
        assert_eq!(merged.get("OPENAI_API_KEY"), Some("request"));
        assert_eq!(merged.get("GEMINI_API_KEY"), Some("g"));
    }

    #[test]
    fn test_debug_never_prints_secrets() {
        let creds = Credentials::new().with("ANTHROPIC_API_KEY", "sk-secret");
        assert!(!format!("{:?}", creds).contains("sk-secret"));

        let binding = ProviderBinding::new(
            Role::Designer,
            ProviderKind::Anthropic,
            "claude-sonnet-4-5",
            "ANTHROPIC_API_KEY",
            "sk-secret",
        );
        assert!(!format!("{:?}", binding).contains("sk-secret"));
        assert!(!serde_json::to_string(&binding).unwrap().contains("sk-secret"));
    }
}
