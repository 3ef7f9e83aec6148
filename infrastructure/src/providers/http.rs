//! HTTP plumbing shared by the provider clients: sending a JSON request and
//! mapping every failure onto [`ProviderError`].

use pipeline_application::ProviderError;
use pipeline_domain::ProviderKind;
use reqwest::header::HeaderValue;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Send `request` and decode a successful JSON body into `R`
pub(crate) async fn send_json<R: DeserializeOwned>(
    provider: ProviderKind,
    request: RequestBuilder,
    timeout: Duration,
) -> Result<R, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|err| map_transport(provider, &err, timeout))?;

    let status = response.status();
    if !status.is_success() {
        let retry_after = parse_retry_after(response.headers().get("retry-after"));
        let body = response.text().await.unwrap_or_default();
        debug!(provider = %provider, status = status.as_u16(), "Provider returned an error status");
        return Err(map_status(provider, status, &body, retry_after));
    }

    response
        .json::<R>()
        .await
        .map_err(|err| ProviderError::InvalidResponse {
            provider,
            message: format!("could not decode response body: {err}"),
        })
}

pub(crate) fn map_transport(
    provider: ProviderKind,
    err: &reqwest::Error,
    timeout: Duration,
) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::Transport {
            provider,
            message: err.to_string(),
        }
    }
}

pub(crate) fn map_status(
    provider: ProviderKind,
    status: StatusCode,
    body: &str,
    retry_after: Option<Duration>,
) -> ProviderError {
    let message = error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth { provider, message },
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            provider,
            retry_after,
        },
        s if s.is_server_error() => ProviderError::Server {
            provider,
            status: s.as_u16(),
            message,
        },
        s => ProviderError::InvalidResponse {
            provider,
            message: format!("HTTP {}: {}", s.as_u16(), message),
        },
    }
}

/// `Retry-After` in delta-seconds form; HTTP-date values are ignored
pub(crate) fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// All three backends wrap failures as `{"error": {"message": ...}}`
fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Envelope {
        error: ErrorBody,
    }

    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<Envelope>(body)
        .ok()
        .map(|e| e.error.message)
        .filter(|m| !m.trim().is_empty())
}
