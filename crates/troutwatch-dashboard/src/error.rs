//! Error types for the dashboard crate.
//!
//! Each failure is scoped to the smallest unit it can affect: a
//! [`RegistrationError`] rejects one registration call, a [`MountError`]
//! leaves one tile on its placeholder, and a [`FetchError`] degrades one
//! refresh cycle.

use std::path::PathBuf;

/// A tile registration was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The tile spec had an empty or blank identifier.
    #[error("tile registration requires a non-empty id")]
    MissingId,
}

/// A tile's mount callback failed.
///
/// The tile stays registered with whatever body it had when the callback
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mount failed: {0}")]
pub struct MountError(pub String);

impl MountError {
    /// Create a mount error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The sensor data text could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP request failed before a response arrived (connect
    /// error, timeout, body read error).
    #[error("request to {url} failed: {message}")]
    Request {
        /// URL that was requested.
        url: String,
        /// Description of the failure.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// URL that was requested.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The data file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
