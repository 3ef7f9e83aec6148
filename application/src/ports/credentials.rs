//! Credential source port

use pipeline_domain::Credentials;

/// Supplies a fresh credential snapshot for each request
///
/// Values are read at call time and never cached by the pipeline.
pub trait CredentialSource: Send + Sync {
    fn snapshot(&self) -> Credentials;
}

/// Fixed credentials, for tests and embedding
pub struct StaticCredentials(pub Credentials);

impl CredentialSource for StaticCredentials {
    fn snapshot(&self) -> Credentials {
        self.0.clone()
    }
}
