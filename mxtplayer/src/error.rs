//! Error types for the catalog client

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when using the catalog client or the play queue
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog server answered with a non-2xx status
    #[error("Catalog server returned HTTP {0}")]
    Status(u16),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid queue index
    #[error("Invalid track index: {0} (queue has {1} tracks)")]
    InvalidIndex(usize, usize),
}
