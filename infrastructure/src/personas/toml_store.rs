//! Persona files: `<dir>/<name>.toml` with a required `prompt` and an
//! optional `description`.

use async_trait::async_trait;
use pipeline_application::{PersonaError, PersonaStore};
use pipeline_domain::{AgentPersona, Role};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PersonaFile {
    prompt: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

pub struct TomlPersonaStore {
    dir: PathBuf,
}

impl TomlPersonaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persona names found in the directory, sorted
    pub async fn available(&self) -> Vec<String> {
        let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await else {
            return Vec::new();
        };

        let mut names = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "toml")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, PersonaError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersonaError::Invalid {
                name: name.to_string(),
                message: "persona names may only contain letters, digits, '-' and '_'".into(),
            });
        }
        Ok(self.dir.join(format!("{name}.toml")))
    }
}

#[async_trait]
impl PersonaStore for TomlPersonaStore {
    async fn load_persona(
        &self,
        role: Role,
        name: Option<&str>,
    ) -> Result<AgentPersona, PersonaError> {
        let name = name.unwrap_or(role.as_str());
        let path = self.path_for(name)?;

        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PersonaError::NotFound {
                    name: name.to_string(),
                    path: path.display().to_string(),
                }
            } else {
                PersonaError::Invalid {
                    name: name.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let file: PersonaFile = toml::from_str(&text).map_err(|e| PersonaError::Invalid {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        let prompt = file
            .prompt
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| PersonaError::Invalid {
                name: name.to_string(),
                message: "missing required 'prompt' field".into(),
            })?;

        debug!(
            role = %role,
            persona = name,
            description = file.description.as_deref().unwrap_or(""),
            "Persona loaded"
        );
        Ok(AgentPersona::new(role, prompt.trim()).with_name(name))
    }
}
