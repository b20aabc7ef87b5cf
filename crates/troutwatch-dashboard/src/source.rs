//! Where the sensor text comes from.
//!
//! Enum dispatch over the two supported sources, so the controller can
//! hold one concrete type without boxing an async trait:
//!
//! - [`HttpSource`] -- `GET` a URL (normally the server's `/data.txt`)
//!   with caching disabled and a request timeout.
//! - [`FileSource`] -- read the data file straight from disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::FetchError;

// ---------------------------------------------------------------------------
// Unified source enum
// ---------------------------------------------------------------------------

/// A source of raw sensor text.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Fetch over HTTP.
    Http(HttpSource),
    /// Read a local file.
    File(FileSource),
}

impl DataSource {
    /// Fetch the current sensor text.
    pub async fn fetch_text(&self) -> Result<String, FetchError> {
        match self {
            Self::Http(source) => source.fetch_text().await,
            Self::File(source) => source.fetch_text().await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Http(_) => "http",
            Self::File(_) => "file",
        }
    }

    /// URL or path being read.
    pub fn location(&self) -> String {
        match self {
            Self::Http(source) => source.url.clone(),
            Self::File(source) => source.path.display().to_string(),
        }
    }
}

impl From<HttpSource> for DataSource {
    fn from(source: HttpSource) -> Self {
        Self::Http(source)
    }
}

impl From<FileSource> for DataSource {
    fn from(source: FileSource) -> Self {
        Self::File(source)
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Cache-bypassing HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    /// Create a fetcher for `url` whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request {
                url: url.clone(),
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client, url })
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_text(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header("Cache-Control", "no-store")
            .header("Pragma", "no-cache")
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Request {
            url: self.url.clone(),
            message: format!("body read failed: {e}"),
        })
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Reads the data file from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a reader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn fetch_text(&self) -> Result<String, FetchError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
