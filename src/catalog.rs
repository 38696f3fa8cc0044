//! Local media discovery
//!
//! Walks a folder tree and collects the files whose names match a
//! [`MediaFilter`]. The same filter is applied to remote file names when
//! downloading an album.

use crate::config::MediaFilter;
use crate::model::LocalItem;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

static IMAGE_PATTERN: OnceLock<Regex> = OnceLock::new();
static VIDEO_PATTERN: OnceLock<Regex> = OnceLock::new();
static ALL_PATTERN: OnceLock<Regex> = OnceLock::new();

const IMAGE_EXTENSIONS: &str = "jpg|png|jpeg|tif|tiff|gif";
const VIDEO_EXTENSIONS: &str = "mov|mp4|avi|mts";

fn extension_pattern(extensions: &str) -> Regex {
    // A name needs at least one character before the extension
    Regex::new(&format!(r"(?i)^.+\.({})$", extensions)).unwrap()
}

impl MediaFilter {
    fn pattern(&self) -> &'static Regex {
        match self {
            MediaFilter::Images => {
                IMAGE_PATTERN.get_or_init(|| extension_pattern(IMAGE_EXTENSIONS))
            }
            MediaFilter::Videos => {
                VIDEO_PATTERN.get_or_init(|| extension_pattern(VIDEO_EXTENSIONS))
            }
            MediaFilter::All => ALL_PATTERN.get_or_init(|| {
                extension_pattern(&format!("{}|{}", IMAGE_EXTENSIONS, VIDEO_EXTENSIONS))
            }),
        }
    }

    /// Check whether a file name belongs to this media type
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern().is_match(file_name)
    }
}

/// Collect all files under `root` matching `filter`, sorted by path
///
/// A missing root is reported and yields no items. Entries that cannot be
/// read during the walk are logged and skipped.
pub fn scan(root: &Path, filter: MediaFilter) -> Vec<LocalItem> {
    if !root.exists() {
        warn!(?root, "Source folder does not exist");
        return Vec::new();
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Unreadable entry, skipping");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(name) = entry.file_name().to_str()
            && filter.matches(name)
        {
            items.push(LocalItem::new(entry.path()));
        }
    }

    items.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(?root, ?filter, count = items.len(), "Scanned source folder");
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_filter_matches() {
        assert!(MediaFilter::Images.matches("IMG_0001.JPG"));
        assert!(MediaFilter::Images.matches("scan.TiFf"));
        assert!(MediaFilter::Images.matches("anim.gif"));
        assert!(!MediaFilter::Images.matches("clip.mov"));
        assert!(!MediaFilter::Images.matches("notes.txt"));
        assert!(!MediaFilter::Images.matches("photo.jpg.bak"));

        assert!(MediaFilter::Videos.matches("clip.MTS"));
        assert!(MediaFilter::Videos.matches("clip.mp4"));
        assert!(!MediaFilter::Videos.matches("photo.png"));

        assert!(MediaFilter::All.matches("photo.jpeg"));
        assert!(MediaFilter::All.matches("clip.avi"));
        assert!(!MediaFilter::All.matches("README"));
    }

    #[test]
    fn test_bare_extension_does_not_match() {
        assert!(!MediaFilter::Images.matches(".jpg"));
        assert!(MediaFilter::Images.matches("a.jpg"));
    }

    #[test]
    fn test_scan_recurses_and_filters() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("2024/summer")).unwrap();
        fs::write(root.join("a.jpg"), b"a").unwrap();
        fs::write(root.join("b.MOV"), b"b").unwrap();
        fs::write(root.join("notes.txt"), b"n").unwrap();
        fs::write(root.join("2024/summer/c.PNG"), b"c").unwrap();
        fs::write(root.join("2024/d.mp4"), b"d").unwrap();

        let paths = |filter| -> Vec<PathBuf> {
            scan(root, filter)
                .into_iter()
                .map(|item| item.path.strip_prefix(root).unwrap().to_path_buf())
                .collect()
        };

        assert_eq!(
            paths(MediaFilter::Images),
            vec![PathBuf::from("2024/summer/c.PNG"), PathBuf::from("a.jpg")]
        );
        assert_eq!(
            paths(MediaFilter::Videos),
            vec![PathBuf::from("2024/d.mp4"), PathBuf::from("b.MOV")]
        );
        assert_eq!(paths(MediaFilter::All).len(), 4);
    }

    #[test]
    fn test_scan_empty_and_missing() {
        let dir = tempdir().unwrap();
        assert!(scan(dir.path(), MediaFilter::All).is_empty());
        assert!(scan(&dir.path().join("missing"), MediaFilter::All).is_empty());
    }

    #[test]
    fn test_scan_is_deterministic() {
        let dir = tempdir().unwrap();
        for name in ["z.jpg", "m.jpg", "a.jpg"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        let first = scan(dir.path(), MediaFilter::Images);
        let second = scan(dir.path(), MediaFilter::Images);
        assert_eq!(first, second);
        assert!(first[0].path.ends_with("a.jpg"));
    }
}
