//! Persona loading adapters.

mod toml_store;

pub use toml_store::TomlPersonaStore;
