//! Configuration types for smugline

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which kinds of media files a command operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MediaFilter {
    /// Image files (jpg, jpeg, png, tif, tiff, gif)
    #[default]
    Images,
    /// Video files (mov, mp4, avi, mts)
    Videos,
    /// Both images and videos
    All,
}

/// Visibility of a newly created album
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    /// Reachable only through its URL
    #[default]
    Unlisted,
    /// Listed on the account's public gallery
    Public,
}

impl Privacy {
    pub fn is_public(&self) -> bool {
        matches!(self, Privacy::Public)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Privacy::Unlisted => "unlisted",
            Privacy::Public => "public",
        }
    }
}

/// Configuration for smugline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API key issued by the photo service
    pub api_key: Option<String>,

    /// Account email address (prompted for when absent)
    pub email: Option<String>,

    /// Endpoint for remote procedure calls
    pub api_url: String,

    /// Endpoint for raw uploads
    pub upload_url: String,

    /// Maximum number of attempts per upload
    pub upload_attempts: u32,

    /// Block size in bytes used when hashing local files
    pub hash_block_size: usize,

    /// Timeout for a single HTTP request, in seconds
    pub request_timeout_secs: u64,

    /// Directory for log files
    pub log_dir: PathBuf,

    /// Dry run mode - read everything, change nothing
    pub dry_run: bool,

    /// Verbose output
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            email: None,
            api_url: "https://api.smugmug.com/services/api/json/1.2.2/".into(),
            upload_url: "https://upload.smugmug.com/".into(),
            upload_attempts: 5,
            hash_block_size: 1024 * 1024, // 1MB
            request_timeout_secs: 300,
            log_dir: PathBuf::from("Log"),
            dry_run: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Check the settings that have no usable fallback
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload_attempts == 0 {
            return Err(ConfigError::Invalid("upload_attempts must be at least 1".into()));
        }
        if self.hash_block_size == 0 {
            return Err(ConfigError::Invalid("hash_block_size must be greater than 0".into()));
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.into(),
            source,
        })?;

        toml::from_str(&text).map_err(|source| ConfigError::ParseError {
            path: path.into(),
            source,
        })
    }

    /// Commented TOML with every setting at its default
    pub fn sample_config() -> String {
        r#"# smugline configuration file

# API key issued by SmugMug (can also be given with --api-key or SMUGLINE_API_KEY)
api_key = "your-api-key"

# Account email address; prompted for when missing
email = "me@example.com"

# Remote endpoints
api_url = "https://api.smugmug.com/services/api/json/1.2.2/"
upload_url = "https://upload.smugmug.com/"

# Attempts per upload before the file is reported as failed
upload_attempts = 5

# Block size in bytes used when hashing local files (1MB)
hash_block_size = 1048576

# Timeout for a single HTTP request, in seconds
request_timeout_secs = 300

# Directory for log files
log_dir = "Log"
"#
        .to_string()
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file '{}': {source}", .path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config file '{}': {source}", .path.display())]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
