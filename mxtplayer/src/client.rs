//! HTTP client for the Mixtape catalog server

use crate::error::{Error, Result};
use crate::library::Library;
use crate::track::Track;
use mxtcatalog::Snapshot;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Default timeout for catalog requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default folder prefix used to classify tracks
pub const DEFAULT_PREFIX: &str = "my-music/";

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "mxtplayer/0.1.0";

/// Client of the `/api/tracks` endpoint
///
/// # Example
///
/// ```no_run
/// use mxtplayer::{CatalogClient, Category};
///
/// # async fn example() -> mxtplayer::Result<()> {
/// let client = CatalogClient::builder("http://localhost:8080", "demo").build()?;
/// let library = client.fetch_library().await?;
/// for track in library.by_category(Category::Mixes) {
///     println!("{} -> {}", track.title, track.stream_url);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    cloud_name: String,
    prefix: String,
}

impl CatalogClient {
    /// `base_url` is the catalog server, `cloud_name` the Cloudinary account
    /// serving the audio files
    pub fn builder(base_url: impl Into<String>, cloud_name: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url, cloud_name)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tracks_url(&self) -> String {
        format!("{}/api/tracks", self.base_url.trim_end_matches('/'))
    }

    /// Fetch the raw snapshot served by the catalog
    pub async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let url = self.tracks_url();
        debug!("Fetching catalog: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch the catalog and classify every entry
    pub async fn fetch_tracks(&self) -> Result<Vec<Track>> {
        let snapshot = self.fetch_snapshot().await?;
        let tracks: Vec<Track> = snapshot
            .resources
            .into_iter()
            .map(|r| Track::from_resource(r, &self.cloud_name, &self.prefix))
            .collect();

        debug!("Received {} tracks", tracks.len());
        Ok(tracks)
    }

    pub async fn fetch_library(&self) -> Result<Library> {
        Ok(Library::new(self.fetch_tracks().await?))
    }
}

/// Builder for configuring a CatalogClient
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    base_url: String,
    cloud_name: String,
    prefix: String,
    timeout: Duration,
    user_agent: String,
}

impl ClientBuilder {
    pub fn new(base_url: impl Into<String>, cloud_name: impl Into<String>) -> Self {
        Self {
            client: None,
            base_url: base_url.into(),
            cloud_name: cloud_name.into(),
            prefix: DEFAULT_PREFIX.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<CatalogClient> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.timeout)
                .build()?,
        };

        Ok(CatalogClient {
            client,
            base_url: self.base_url,
            cloud_name: self.cloud_name,
            prefix: self.prefix,
        })
    }
}
