//! Error types for smugline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for smugline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for smugline
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File hash computation failed for {path}: {message}")]
    HashComputation { path: PathBuf, message: String },

    /// Network or service hiccup; worth another attempt
    #[error("Transient transfer error: {0}")]
    Transfer(String),

    #[error("Album not found: {0}")]
    NotFound(String),

    #[error("No permission to download {0}")]
    Permission(String),

    #[error("Remote API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Login failed: {0}")]
    Auth(String),

    #[error("Unexpected API response for {method}: {message}")]
    Response { method: String, message: String },

    /// A file name that cannot be used as given
    #[error("Unusable file name: {0}")]
    FileName(String),

    #[error("Invalid upload header {name}: {message}")]
    Header { name: String, message: String },

    #[error("Manifest error in {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

impl Error {
    /// Whether a retry of the failed call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transfer(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let server_side = err.status().is_some_and(|s| s.is_server_error());
        if err.is_timeout() || err.is_connect() || err.is_request() || server_side {
            Error::Transfer(err.to_string())
        } else {
            Error::Http(err)
        }
    }
}
