//! Error types for the catalog cache

use std::time::Duration;

/// Errors raised while fetching the upstream resource listing
///
/// Cloneable so that every caller waiting on a shared refresh receives the
/// same outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Transport failure (DNS, connection refused, TLS, reset...)
    #[error("Network error: {0}")]
    Network(String),

    /// The upstream answered with a non-2xx status
    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    /// The call exceeded the configured bound
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// Malformed or unexpected-shape JSON body
    #[error("Invalid upstream response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Classe une erreur reqwest dans la taxonomie du fetcher
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Fatal configuration errors, detected before the server starts listening
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required credential is absent or empty
    #[error("Missing required configuration: {0} is not set")]
    Missing(&'static str),

    /// Unknown webhook policy name
    #[error("Invalid webhook policy '{0}' (expected 'any' or 'filtered')")]
    InvalidPolicy(String),
}
