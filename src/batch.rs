//! Upload manifests
//!
//! A manifest is a JSON array of upload directives:
//!
//! ```json
//! [
//!   {"File": "2014/beach.jpg", "AlbumName": "Summer", "Caption": "Sunset"},
//!   {"File": "2014/party.jpg", "AlbumName": "Birthday"}
//! ]
//! ```
//!
//! `File` is relative to the source folder. Every field besides `File` and
//! `AlbumName` is forwarded with the upload as metadata.

use crate::error::{Error, Result};
use crate::model::LocalItem;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// One upload directive
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "File")]
    pub file: String,

    #[serde(rename = "AlbumName")]
    pub album_name: String,

    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// Files bound for the same album
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumGroup {
    pub album_name: String,
    pub items: Vec<LocalItem>,
}

/// Read a manifest file
pub fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let file = File::open(path).map_err(|e| Error::Manifest {
        path: path.to_path_buf(),
        message: format!("Failed to open: {}", e),
    })?;

    let entries: Vec<ManifestEntry> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    debug!(?path, entries = entries.len(), "Loaded manifest");
    Ok(entries)
}

/// Group entries by exact album name, resolving files against `source_folder`
///
/// Names differing only in case form separate groups. Groups come out in
/// album-name order; within a group, entries keep manifest order.
pub fn group_by_album(entries: Vec<ManifestEntry>, source_folder: &Path) -> Vec<AlbumGroup> {
    let mut groups: BTreeMap<String, Vec<LocalItem>> = BTreeMap::new();

    for entry in entries {
        let relative = entry.file.trim_start_matches(['/', '\\']);
        let item = LocalItem {
            path: source_folder.join(relative),
            album_hint: Some(entry.album_name.clone()),
            metadata: entry.metadata,
        };
        groups.entry(entry.album_name).or_default().push(item);
    }

    groups
        .into_iter()
        .map(|(album_name, items)| AlbumGroup { album_name, items })
        .collect()
}
