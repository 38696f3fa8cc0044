//! Typed records shared by the catalog, dedup and transfer layers
//!
//! Remote responses are mapped into these types at the API boundary, so
//! nothing past `remote` deals with the service's response shapes.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// A file on disk that is a candidate for upload
#[derive(Debug, Clone, PartialEq)]
pub struct LocalItem {
    pub path: PathBuf,
    /// Target album named by a manifest entry
    pub album_hint: Option<String>,
    /// Extra manifest fields forwarded with the upload (caption, keywords, ...)
    pub metadata: Map<String, Value>,
}

impl LocalItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            album_hint: None,
            metadata: Map::new(),
        }
    }
}

/// An image or video already stored in a remote album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: i64,
    pub key: String,
    pub file_name: String,
    pub content_digest: String,
    /// Absent when the account may not download the original
    pub original_url: Option<String>,
    pub captured_at: Option<NaiveDateTime>,
}

/// A remote album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: i64,
    pub key: String,
    pub title: String,
    pub is_public: bool,
    pub url: Option<String>,
}

/// Album attributes only available through an info lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumDetails {
    pub url: Option<String>,
}

/// Per-image attributes only available through an info lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub captured_at: Option<NaiveDateTime>,
}

/// An authenticated session, passed explicitly to every remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub nickname: String,
}

/// Optional per-image fields requested from an image listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extras {
    pub digest: bool,
    pub file_name: bool,
    pub original_url: bool,
}

impl Extras {
    /// Enough to build a digest set
    pub const DIGEST: Extras = Extras {
        digest: true,
        file_name: false,
        original_url: false,
    };

    /// Enough to report and delete duplicates
    pub const DIGEST_AND_NAME: Extras = Extras {
        digest: true,
        file_name: true,
        original_url: false,
    };

    /// Enough to download originals
    pub const DOWNLOAD: Extras = Extras {
        digest: false,
        file_name: true,
        original_url: true,
    };

    /// Comma-separated field list in the service's naming
    pub fn to_param(&self) -> String {
        let mut fields = Vec::new();
        if self.digest {
            fields.push("MD5Sum");
        }
        if self.file_name {
            fields.push("FileName");
        }
        if self.original_url {
            fields.push("OriginalURL");
        }
        fields.join(",")
    }
}
