//! Content-based duplicate detection
//!
//! Two items are the same content exactly when their digests are equal,
//! regardless of file name or timestamp. Local candidates are compared
//! against the digests of one remote album; remote albums are checked for
//! repeated digests in the order the service reports them.

use crate::hash::ContentHasher;
use crate::model::{LocalItem, RemoteItem};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::{info, warn};

/// Digests present in one album, fetched per pass and never persisted
pub type DigestSet = HashSet<String>;

/// Why a candidate was left out of the upload set
#[derive(Debug, Clone, PartialEq)]
pub enum ExclusionReason {
    /// Identical content is already present in the album
    Duplicate { digest: String },
    /// Identical to an earlier candidate of the same batch, which stands
    /// in for it; this copy only counts as present if that one arrives
    SameAsCandidate {
        digest: String,
        representative: PathBuf,
    },
    /// The file could not be hashed
    Unreadable { message: String },
}

/// A candidate excluded from upload
#[derive(Debug, Clone, PartialEq)]
pub struct Excluded {
    pub item: LocalItem,
    pub reason: ExclusionReason,
}

/// A candidate carrying new content, with the digest it was hashed to
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub item: LocalItem,
    pub digest: String,
}

/// Outcome of comparing local candidates against an album
#[derive(Debug, Default)]
pub struct Partition {
    /// New content, in candidate order
    pub keep: Vec<Candidate>,
    /// Duplicates and unreadable files, in candidate order
    pub duplicates: Vec<Excluded>,
}

/// Build the digest set of an album's listing
///
/// Items without a reported digest are left out.
pub fn digest_set(items: &[RemoteItem]) -> DigestSet {
    items
        .iter()
        .filter(|item| !item.content_digest.is_empty())
        .map(|item| item.content_digest.clone())
        .collect()
}

/// Split candidates into new content and duplicates
///
/// The first candidate with a given digest is kept; later ones with the
/// same digest point back to it, so identical files within one batch are
/// uploaded once. A file that cannot be hashed is excluded and reported;
/// it never stops the batch.
pub fn partition(
    candidates: Vec<LocalItem>,
    remote_digests: &DigestSet,
    hasher: &ContentHasher,
) -> Partition {
    let mut kept: HashMap<String, PathBuf> = HashMap::new();
    let mut result = Partition::default();

    for item in candidates {
        let digest = match hasher.digest(&item.path) {
            Ok(digest) => digest,
            Err(e) => {
                warn!(path = %item.path.display(), error = %e, "I/O error, skipping");
                result.duplicates.push(Excluded {
                    item,
                    reason: ExclusionReason::Unreadable {
                        message: e.to_string(),
                    },
                });
                continue;
            }
        };

        let reason = if remote_digests.contains(&digest) {
            ExclusionReason::Duplicate { digest }
        } else if let Some(representative) = kept.get(&digest) {
            ExclusionReason::SameAsCandidate {
                digest,
                representative: representative.clone(),
            }
        } else {
            kept.insert(digest.clone(), item.path.clone());
            result.keep.push(Candidate { item, digest });
            continue;
        };

        info!(path = %item.path.display(), "skipping {} (duplicate)", item.path.display());
        result.duplicates.push(Excluded { item, reason });
    }

    result
}

/// Find the images to delete so each digest appears once in an album
///
/// Items are taken in the given order: the first occurrence of a digest is
/// kept and every later one is returned. Items without a digest are never
/// returned.
pub fn find_remote_duplicates(items: &[RemoteItem]) -> Vec<RemoteItem> {
    let mut seen: HashSet<&str> = HashSet::new();
    items
        .iter()
        .filter(|item| !item.content_digest.is_empty())
        .filter(|item| !seen.insert(item.content_digest.as_str()))
        .cloned()
        .collect()
}
