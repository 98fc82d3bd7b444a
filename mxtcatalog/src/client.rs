//! HTTP client for the Cloudinary Admin API
//!
//! The client performs exactly one authenticated GET on the resource-listing
//! endpoint per call and never retries: a failed call leaves the decision to
//! the caller.
//!
//! # Example
//!
//! ```no_run
//! use mxtcatalog::{CloudinaryClient, CloudinaryCredentials};
//!
//! # async fn example() -> Result<(), mxtcatalog::FetchError> {
//! let credentials = CloudinaryCredentials::new("demo", "key", "secret");
//! let client = CloudinaryClient::builder(credentials)
//!     .prefix("my-music/")
//!     .build()?;
//!
//! let resources = client.list_resources().await?;
//! println!("{} tracks upstream", resources.len());
//! # Ok(())
//! # }
//! ```

use crate::error::FetchError;
use crate::models::{Resource, Snapshot};
use crate::source::ResourceSource;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Default Cloudinary API base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// Default timeout for the listing call (10 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default folder holding the audio files
pub const DEFAULT_PREFIX: &str = "my-music/";

/// Default cap on the number of listed resources
pub const DEFAULT_MAX_RESULTS: u32 = 100;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "Mixtape/0.1 (mxtcatalog)";

/// Identifiants du compte Cloudinary
#[derive(Clone, PartialEq, Eq)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryCredentials {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

// Le secret ne doit jamais apparaître dans les logs
impl fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish()
    }
}

/// Cloudinary resource-listing client
///
/// Audio files are stored by Cloudinary under the `video` resource type, so
/// the listing always targets `/resources/video` filtered on `type=upload`.
#[derive(Debug, Clone)]
pub struct CloudinaryClient {
    client: Client,
    base_url: String,
    credentials: CloudinaryCredentials,
    prefix: String,
    max_results: u32,
    timeout: Duration,
}

impl CloudinaryClient {
    /// Create a builder for configuring the client
    pub fn builder(credentials: CloudinaryCredentials) -> ClientBuilder {
        ClientBuilder::new(credentials)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL complète de l'endpoint de listing
    pub fn resources_url(&self) -> String {
        format!(
            "{}/v1_1/{}/resources/video",
            self.base_url.trim_end_matches('/'),
            self.credentials.cloud_name
        )
    }

    /// List the uploaded resources under the configured prefix
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] if the call exceeds the configured bound
    /// - [`FetchError::Network`] on transport failure
    /// - [`FetchError::Status`] on a non-2xx answer
    /// - [`FetchError::Decode`] if the body is not the expected JSON document
    pub async fn list_resources(&self) -> Result<Vec<Resource>, FetchError> {
        let url = self.resources_url();
        let max_results = self.max_results.to_string();
        debug!(url = %url, prefix = %self.prefix, "Listing Cloudinary resources");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("type", "upload"),
                ("prefix", self.prefix.as_str()),
                ("max_results", max_results.as_str()),
            ])
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let snapshot: Snapshot =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(snapshot.resources)
    }
}

#[async_trait]
impl ResourceSource for CloudinaryClient {
    async fn fetch_resources(&self) -> Result<Vec<Resource>, FetchError> {
        self.list_resources().await
    }

    fn describe(&self) -> String {
        format!("cloudinary:{}/{}", self.credentials.cloud_name, self.prefix)
    }
}

/// Builder for configuring a CloudinaryClient
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    credentials: CloudinaryCredentials,
    base_url: String,
    prefix: String,
    max_results: u32,
    timeout: Duration,
    user_agent: String,
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new(credentials: CloudinaryCredentials) -> Self {
        Self {
            client: None,
            credentials,
            base_url: DEFAULT_API_BASE.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the API base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the folder prefix used to filter the listing
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the maximum number of listed resources
    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<CloudinaryClient, FetchError> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.timeout)
                .build()
                .map_err(|e| FetchError::Network(e.to_string()))?,
        };

        Ok(CloudinaryClient {
            client,
            base_url: self.base_url,
            credentials: self.credentials,
            prefix: self.prefix,
            max_results: self.max_results,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> CloudinaryCredentials {
        CloudinaryCredentials::new("demo", "key", "secret")
    }

    #[test]
    fn test_builder_defaults() {
        let client = CloudinaryClient::builder(credentials()).build().unwrap();
        assert_eq!(client.base_url(), DEFAULT_API_BASE);
        assert_eq!(client.prefix(), DEFAULT_PREFIX);
        assert_eq!(
            client.timeout(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_resources_url() {
        let client = CloudinaryClient::builder(credentials())
            .base_url("http://localhost:1234/")
            .build()
            .unwrap();
        assert_eq!(
            client.resources_url(),
            "http://localhost:1234/v1_1/demo/resources/video"
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("demo"));
        assert!(!debug.contains("secret\""));
        assert!(debug.contains("***"));
    }
}
