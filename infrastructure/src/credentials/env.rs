//! Credentials from the process environment

use pipeline_application::CredentialSource;
use pipeline_domain::Credentials;

/// Reads the environment on every snapshot so keys exported after start-up
/// are picked up by the next request. Non-UTF-8 variables are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn snapshot(&self) -> Credentials {
        Credentials::from_pairs(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_sees_process_environment() {
        let snapshot = EnvCredentials.snapshot();
        if let Ok(path) = std::env::var("PATH") {
            assert_eq!(snapshot.get("PATH"), Some(path.as_str()));
        }
        assert_eq!(snapshot.get("PRODUCT_PIPELINE_UNSET_CREDENTIAL"), None);
    }
}
