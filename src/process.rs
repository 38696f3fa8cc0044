//! Command orchestration
//!
//! [`Processor`] owns the session and runs each command:
//! - Resolving the target album
//! - Fetching the album's digests once per album
//! - Partitioning local candidates into new content and duplicates
//! - Uploading, downloading or deleting item by item
//!
//! Per-item failures become a [`FileResult`] and the run continues; only
//! failures that make the whole command impossible are returned as errors.

use crate::album::{AlbumResolver, format_album_name};
use crate::batch::{AlbumGroup, group_by_album, load_manifest};
use crate::catalog;
use crate::config::{Config, MediaFilter, Privacy};
use crate::dedup::{DigestSet, ExclusionReason, digest_set, find_remote_duplicates, partition};
use crate::error::{Error, Result};
use crate::hash::ContentHasher;
use crate::model::{Album, Extras, LocalItem, Session};
use crate::remote::RemoteApi;
use crate::transfer::{DownloadOutcome, RetryPolicy, TransferEngine, UploadOutcome};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{Level, error, info, span, warn};

/// Result of processing a single item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    /// Local path or remote file name
    pub source: String,
    /// Album title or local path the item went to
    pub target: Option<String>,
    /// Processing status
    pub status: ProcessingStatus,
    /// Error message (if failed or skipped on error)
    pub error: Option<String>,
}

impl FileResult {
    fn new(source: impl Into<String>, target: Option<String>, status: ProcessingStatus) -> Self {
        Self {
            source: source.into(),
            target,
            status,
            error: None,
        }
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Status of item processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    /// Stored in the remote album
    Uploaded,
    /// Written to the local folder
    Downloaded,
    /// Identical content already present
    Duplicate,
    /// Left alone (exists locally, no permission, unreadable)
    Skipped,
    /// Removed from the remote album as a duplicate
    Deleted,
    /// Transfer or deletion failed
    Failed,
    /// Dry run - would have been transferred or deleted
    DryRun,
}

/// Processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub uploaded: usize,
    pub downloaded: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub failed: usize,
    pub planned: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, status: ProcessingStatus) {
        match status {
            ProcessingStatus::Uploaded => self.uploaded += 1,
            ProcessingStatus::Downloaded => self.downloaded += 1,
            ProcessingStatus::Duplicate => self.duplicates += 1,
            ProcessingStatus::Skipped => self.skipped += 1,
            ProcessingStatus::Deleted => self.deleted += 1,
            ProcessingStatus::Failed => self.failed += 1,
            ProcessingStatus::DryRun => self.planned += 1,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Uploaded: {}, Downloaded: {}, Duplicates: {}, Skipped: {}, Deleted: {}, Failed: {}",
            self.uploaded, self.downloaded, self.duplicates, self.skipped, self.deleted, self.failed
        )
    }
}

/// Runs commands against one remote account
pub struct Processor<'a> {
    remote: &'a dyn RemoteApi,
    session: Session,
    hasher: ContentHasher,
    retry: RetryPolicy,
    dry_run: bool,
    stats: ProcessingStats,
}

impl<'a> Processor<'a> {
    /// Create a processor for an authenticated session
    pub fn new(remote: &'a dyn RemoteApi, session: Session, config: &Config) -> Self {
        Self {
            remote,
            session,
            hasher: ContentHasher::new(config.hash_block_size),
            retry: RetryPolicy::new(config.upload_attempts),
            dry_run: config.dry_run,
            stats: ProcessingStats::new(),
        }
    }

    /// Log in and create a processor for the new session
    pub fn login(
        remote: &'a dyn RemoteApi,
        email: &str,
        password: &str,
        config: &Config,
    ) -> Result<Self> {
        let session = remote.login(email, password)?;
        info!(nickname = %session.nickname, "Logged in");
        Ok(Self::new(remote, session, config))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get processing statistics reference
    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    fn resolver(&self) -> AlbumResolver<'_> {
        AlbumResolver::new(self.remote, &self.session)
    }

    fn engine(&self) -> TransferEngine<'_> {
        TransferEngine::new(self.remote, &self.session, self.retry, self.dry_run)
    }

    /// Upload the matching files under `source` into an album, creating it if needed
    pub fn upload_folder(
        &mut self,
        source: &Path,
        album_name: &str,
        filter: MediaFilter,
        privacy: Privacy,
    ) -> Result<Vec<FileResult>> {
        let _span = span!(Level::INFO, "upload", album = album_name).entered();

        let items = catalog::scan(source, filter);
        info!(count = items.len(), source = %source.display(), "Found media files");
        self.upload_group(album_name, items, privacy)
    }

    /// Upload every directive of a manifest, one album at a time
    pub fn process_manifest(&mut self, manifest: &Path, source: &Path) -> Result<Vec<FileResult>> {
        let _span = span!(Level::INFO, "process", manifest = %manifest.display()).entered();

        let entries = load_manifest(manifest)?;
        let groups = group_by_album(entries, source);
        info!(albums = groups.len(), "Grouped manifest entries by album");
        self.upload_groups(groups)
    }

    /// Upload pre-grouped items; each album is resolved and listed once
    pub fn upload_groups(&mut self, groups: Vec<AlbumGroup>) -> Result<Vec<FileResult>> {
        let mut results = Vec::new();
        for group in groups {
            results.extend(self.upload_group(&group.album_name, group.items, Privacy::default())?);
        }
        Ok(results)
    }

    fn upload_group(
        &mut self,
        album_name: &str,
        items: Vec<LocalItem>,
        privacy: Privacy,
    ) -> Result<Vec<FileResult>> {
        let (album, remote_digests) = self.prepare_album(album_name, privacy)?;
        let split = partition(items, &remote_digests, &self.hasher);

        let mut results = Vec::with_capacity(split.keep.len() + split.duplicates.len());
        let mut failed_uploads: HashMap<PathBuf, String> = HashMap::new();

        for candidate in split.keep {
            let source = candidate.item.path.display().to_string();
            info!("uploading {} -> {}", source, album.title);

            let target = Some(album.title.clone());
            let result = match self.engine().upload(&album, &candidate.item, &candidate.digest) {
                Ok(UploadOutcome::Uploaded { .. }) => {
                    FileResult::new(source, target, ProcessingStatus::Uploaded)
                }
                Ok(UploadOutcome::Planned) => {
                    FileResult::new(source, target, ProcessingStatus::DryRun)
                }
                Err(e) => {
                    error!(path = %source, error = %e, "Upload failed, giving up on file");
                    failed_uploads.insert(candidate.item.path, e.to_string());
                    FileResult::new(source, target, ProcessingStatus::Failed)
                        .with_error(e.to_string())
                }
            };
            self.stats.record(result.status);
            results.push(result);
        }

        // copies of a file that never arrived are not in the album either
        for excluded in split.duplicates {
            let source = excluded.item.path.display().to_string();
            let target = Some(album.title.clone());
            let result = match excluded.reason {
                ExclusionReason::Duplicate { .. } => {
                    FileResult::new(source, target, ProcessingStatus::Duplicate)
                }
                ExclusionReason::SameAsCandidate { representative, .. } => {
                    match failed_uploads.get(&representative) {
                        Some(message) => {
                            warn!(path = %source, "Identical file failed to upload");
                            let message = format!(
                                "same content as {}, which failed to upload: {}",
                                representative.display(),
                                message
                            );
                            FileResult::new(source, target, ProcessingStatus::Failed)
                                .with_error(message)
                        }
                        None => FileResult::new(source, target, ProcessingStatus::Duplicate),
                    }
                }
                ExclusionReason::Unreadable { message } => {
                    FileResult::new(source, None, ProcessingStatus::Skipped).with_error(message)
                }
            };
            self.stats.record(result.status);
            results.push(result);
        }

        info!(album = %album.title, "{}", self.stats.summary());
        Ok(results)
    }

    /// Resolve the album and fetch its digests
    ///
    /// In a dry run a missing album is not created; it stands in as an
    /// empty album with the title it would get.
    fn prepare_album(&self, album_name: &str, privacy: Privacy) -> Result<(Album, DigestSet)> {
        let album = if self.dry_run {
            match self.resolver().find(album_name)? {
                Some(album) => album,
                None => {
                    let title = format_album_name(album_name);
                    info!(album = %title, privacy = privacy.label(), "Would create album");
                    let placeholder = Album {
                        id: 0,
                        key: String::new(),
                        title,
                        is_public: privacy.is_public(),
                        url: None,
                    };
                    return Ok((placeholder, DigestSet::new()));
                }
            }
        } else {
            self.resolver().resolve(album_name, privacy)?
        };

        let listing = self.remote.list_images(&self.session, &album, Extras::DIGEST)?;
        let digests = digest_set(&listing);
        info!(album = %album.title, remote_items = listing.len(), "Fetched album digests");
        Ok((album, digests))
    }

    /// Download the matching images of an album into `dest`
    pub fn download_album(
        &mut self,
        album_name: &str,
        dest: &Path,
        filter: MediaFilter,
    ) -> Result<Vec<FileResult>> {
        let _span = span!(Level::INFO, "download", album = album_name).entered();

        let album = self.find_existing(album_name)?;
        let images: Vec<_> = self
            .remote
            .list_images(&self.session, &album, Extras::DOWNLOAD)?
            .into_iter()
            .filter(|image| filter.matches(&image.file_name))
            .collect();
        info!(album = %album.title, count = images.len(), "Found remote media files");

        let mut results = Vec::with_capacity(images.len());
        for image in images {
            info!("downloading {} -> {}", image.file_name, dest.display());

            let result = match self.engine().download(&image, dest) {
                Ok(DownloadOutcome::Downloaded(path)) => FileResult::new(
                    image.file_name,
                    Some(path.display().to_string()),
                    ProcessingStatus::Downloaded,
                ),
                Ok(DownloadOutcome::Exists(path)) => FileResult::new(
                    image.file_name,
                    Some(path.display().to_string()),
                    ProcessingStatus::Skipped,
                ),
                Ok(DownloadOutcome::NoPermission) => {
                    let message = Error::Permission(image.file_name.clone()).to_string();
                    FileResult::new(image.file_name, None, ProcessingStatus::Skipped)
                        .with_error(message)
                }
                Ok(DownloadOutcome::Planned(path)) => FileResult::new(
                    image.file_name,
                    Some(path.display().to_string()),
                    ProcessingStatus::DryRun,
                ),
                Err(e) => {
                    error!(file = %image.file_name, error = %e, "Download failed");
                    FileResult::new(image.file_name, None, ProcessingStatus::Failed)
                        .with_error(e.to_string())
                }
            };
            self.stats.record(result.status);
            results.push(result);
        }

        info!(album = %album.title, "{}", self.stats.summary());
        Ok(results)
    }

    /// Delete every image whose content already appears earlier in the album
    pub fn clear_duplicates(&mut self, album_name: &str) -> Result<Vec<FileResult>> {
        let _span = span!(Level::INFO, "clear_duplicates", album = album_name).entered();

        let album = self.find_existing(album_name)?;
        let listing = self
            .remote
            .list_images(&self.session, &album, Extras::DIGEST_AND_NAME)?;
        let doomed = find_remote_duplicates(&listing);
        info!(
            album = %album.title,
            total = listing.len(),
            duplicates = doomed.len(),
            "Scanned album"
        );

        let mut results = Vec::with_capacity(doomed.len());
        for image in doomed {
            info!("deleting image {} (md5: {})", image.file_name, image.content_digest);

            let source = image.file_name.clone();
            let target = Some(album.title.clone());
            let result = if self.dry_run {
                FileResult::new(source, target, ProcessingStatus::DryRun)
            } else {
                match self.remote.delete_image(&self.session, &image) {
                    Ok(()) => FileResult::new(source, target, ProcessingStatus::Deleted),
                    Err(e) => {
                        error!(file = %image.file_name, error = %e, "Delete failed");
                        FileResult::new(source, target, ProcessingStatus::Failed)
                            .with_error(e.to_string())
                    }
                }
            };
            self.stats.record(result.status);
            results.push(result);
        }

        Ok(results)
    }

    /// Titles of all albums of the account
    pub fn list_albums(&self) -> Result<Vec<String>> {
        self.resolver().list_titles()
    }

    /// Create an album unconditionally; `None` in a dry run
    pub fn create_album(&self, name: &str, privacy: Privacy) -> Result<Option<Album>> {
        if name.is_empty() {
            return Err(Error::Config("Album name must not be empty".into()));
        }
        if self.dry_run {
            let title = format_album_name(name);
            info!(album = %title, privacy = privacy.label(), "Would create album");
            return Ok(None);
        }
        self.resolver().create(name, privacy).map(Some)
    }

    fn find_existing(&self, album_name: &str) -> Result<Album> {
        self.resolver().find(album_name)?.ok_or_else(|| {
            warn!("Album {} not found", album_name);
            Error::NotFound(album_name.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::ManifestEntry;
    use crate::hash::digest_bytes;
    use crate::model::RemoteItem;
    use crate::remote::MockRemoteApi;
    use serde_json::Map;
    use std::fs;
    use std::io::{Cursor, Read};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn session() -> Session {
        Session {
            id: "sess".into(),
            nickname: "jdoe".into(),
        }
    }

    fn album(id: i64, title: &str) -> Album {
        Album {
            id,
            key: format!("k{}", id),
            title: title.into(),
            is_public: false,
            url: None,
        }
    }

    fn remote_item(id: i64, name: &str, digest: &str) -> RemoteItem {
        RemoteItem {
            id,
            key: format!("img{}", id),
            file_name: name.into(),
            content_digest: digest.into(),
            original_url: Some(format!("https://x/{}", name)),
            captured_at: None,
        }
    }

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn test_processing_stats() {
        let mut stats = ProcessingStats::new();
        for status in [
            ProcessingStatus::Uploaded,
            ProcessingStatus::Uploaded,
            ProcessingStatus::Duplicate,
            ProcessingStatus::Failed,
            ProcessingStatus::Deleted,
        ] {
            stats.record(status);
        }

        let summary = stats.summary();
        assert!(summary.contains("Uploaded: 2"));
        assert!(summary.contains("Duplicates: 1"));
        assert!(summary.contains("Failed: 1"));
        assert!(summary.contains("Deleted: 1"));
    }

    #[test]
    fn test_upload_folder_skips_remote_duplicates() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("old.jpg"), b"old").unwrap();
        fs::write(dir.path().join("new.jpg"), b"new").unwrap();
        fs::write(dir.path().join("clip.mov"), b"video").unwrap();

        let uploaded = Arc::new(Mutex::new(Vec::new()));
        let sink = uploaded.clone();

        let mut remote = MockRemoteApi::new();
        remote
            .expect_list_albums()
            .times(1)
            .returning(|_| Ok(vec![album(1, "Vacation")]));
        remote
            .expect_list_images()
            .times(1)
            .returning(|_, _, _| Ok(vec![remote_item(1, "old.jpg", &digest_bytes(b"old"))]));
        remote
            .expect_upload_image()
            .returning(move |_, album, path, _, _| {
                sink.lock().unwrap().push((album.id, path.to_path_buf()));
                Ok(())
            });

        let mut processor = Processor::new(&remote, session(), &config());
        let results = processor
            .upload_folder(dir.path(), "vacation", MediaFilter::Images, Privacy::Unlisted)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(*uploaded.lock().unwrap(), vec![(1, dir.path().join("new.jpg"))]);
        assert_eq!(processor.stats().uploaded, 1);
        assert_eq!(processor.stats().duplicates, 1);
    }

    #[test]
    fn test_upload_failure_does_not_abort_batch() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"a").unwrap();
        fs::write(dir.path().join("b.jpg"), b"b").unwrap();

        let mut remote = MockRemoteApi::new();
        remote.expect_list_albums().returning(|_| Ok(vec![album(1, "Trip")]));
        remote.expect_list_images().returning(|_, _, _| Ok(Vec::new()));
        remote.expect_upload_image().returning(|_, _, path, _, _| {
            if path.ends_with("a.jpg") {
                Err(Error::Transfer("connection reset".into()))
            } else {
                Ok(())
            }
        });

        let mut processor = Processor::new(&remote, session(), &config());
        let results = processor
            .upload_folder(dir.path(), "Trip", MediaFilter::Images, Privacy::Unlisted)
            .unwrap();

        let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![ProcessingStatus::Failed, ProcessingStatus::Uploaded]);
        assert!(results[0].error.is_some());
    }

    #[test]
    fn test_copies_of_failed_upload_are_not_reported_present() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"same").unwrap();
        fs::write(dir.path().join("b.jpg"), b"same").unwrap();
        fs::write(dir.path().join("c.jpg"), b"other").unwrap();

        let mut remote = MockRemoteApi::new();
        remote.expect_list_albums().returning(|_| Ok(vec![album(1, "Trip")]));
        remote.expect_list_images().returning(|_, _, _| Ok(Vec::new()));
        remote
            .expect_upload_image()
            .withf(|_, _, path, digest, _| {
                let expected: &[u8] = if path.ends_with("c.jpg") { b"other" } else { b"same" };
                digest == digest_bytes(expected)
            })
            .times(2)
            .returning(|_, _, path, _, _| {
                if path.ends_with("a.jpg") {
                    Err(Error::Api {
                        code: 5,
                        message: "system error".into(),
                    })
                } else {
                    Ok(())
                }
            });

        let mut processor = Processor::new(&remote, session(), &config());
        let results = processor
            .upload_folder(dir.path(), "Trip", MediaFilter::Images, Privacy::Unlisted)
            .unwrap();

        let statuses: Vec<_> = results
            .iter()
            .map(|r| (r.source.rsplit(['/', '\\']).next().unwrap(), r.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("a.jpg", ProcessingStatus::Failed),
                ("c.jpg", ProcessingStatus::Uploaded),
                ("b.jpg", ProcessingStatus::Failed),
            ]
        );
        assert!(results[2].error.as_deref().unwrap().contains("a.jpg"));
        assert_eq!(processor.stats().duplicates, 0);
        assert_eq!(processor.stats().failed, 2);
    }

    #[test]
    fn test_copies_of_uploaded_file_are_duplicates() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"same").unwrap();
        fs::write(dir.path().join("b.jpg"), b"same").unwrap();

        let mut remote = MockRemoteApi::new();
        remote.expect_list_albums().returning(|_| Ok(vec![album(1, "Trip")]));
        remote.expect_list_images().returning(|_, _, _| Ok(Vec::new()));
        remote
            .expect_upload_image()
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));

        let mut processor = Processor::new(&remote, session(), &config());
        let results = processor
            .upload_folder(dir.path(), "Trip", MediaFilter::Images, Privacy::Unlisted)
            .unwrap();

        let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![ProcessingStatus::Uploaded, ProcessingStatus::Duplicate]);
        assert_eq!(results[1].target.as_deref(), Some("Trip"));
    }

    #[test]
    fn test_manifest_groups_resolve_and_list_once_per_album() {
        let dir = tempdir().unwrap();
        for (name, content) in [("1.jpg", "one"), ("2.jpg", "two"), ("3.jpg", "one")] {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let manifest = dir.path().join("manifest.json");
        fs::write(
            &manifest,
            r#"[
                {"File": "1.jpg", "AlbumName": "A"},
                {"File": "2.jpg", "AlbumName": "B", "Caption": "Second"},
                {"File": "3.jpg", "AlbumName": "A"}
            ]"#,
        )
        .unwrap();

        let captions = Arc::new(Mutex::new(Vec::new()));
        let sink = captions.clone();

        let mut remote = MockRemoteApi::new();
        remote
            .expect_list_albums()
            .times(2)
            .returning(|_| Ok(vec![album(1, "A"), album(2, "B")]));
        remote
            .expect_list_images()
            .times(2)
            .returning(|_, _, _| Ok(Vec::new()));
        remote
            .expect_upload_image()
            .times(2)
            .returning(move |_, album, _, _, metadata| {
                sink.lock()
                    .unwrap()
                    .push((album.title.clone(), metadata.get("Caption").cloned()));
                Ok(())
            });

        let mut processor = Processor::new(&remote, session(), &config());
        let results = processor.process_manifest(&manifest, dir.path()).unwrap();

        // 3.jpg repeats 1.jpg within album A
        assert_eq!(results.len(), 3);
        assert_eq!(processor.stats().uploaded, 2);
        assert_eq!(processor.stats().duplicates, 1);
        assert_eq!(
            *captions.lock().unwrap(),
            vec![
                ("A".to_string(), None),
                ("B".to_string(), Some(serde_json::Value::from("Second")))
            ]
        );
    }

    #[test]
    fn test_upload_groups_creates_missing_album_once() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"a").unwrap();

        let mut remote = MockRemoteApi::new();
        remote.expect_list_albums().times(1).returning(|_| Ok(Vec::new()));
        remote
            .expect_create_album()
            .times(1)
            .returning(|_, title, _| Ok(album(7, title)));
        remote.expect_album_info().returning(|_, _| {
            Ok(crate::model::AlbumDetails { url: None })
        });
        remote.expect_list_images().times(1).returning(|_, _, _| Ok(Vec::new()));
        remote
            .expect_upload_image()
            .withf(|_, album, _, _, _| album.id == 7)
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));

        let groups = group_by_album(
            vec![ManifestEntry {
                file: "a.jpg".into(),
                album_name: "new album".into(),
                metadata: Map::new(),
            }],
            dir.path(),
        );
        let mut processor = Processor::new(&remote, session(), &config());
        processor.upload_groups(groups).unwrap();
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"a").unwrap();

        let mut remote = MockRemoteApi::new();
        remote.expect_list_albums().returning(|_| Ok(Vec::new()));
        remote.expect_create_album().never();
        remote.expect_list_images().never();
        remote.expect_upload_image().never();

        let config = Config {
            dry_run: true,
            ..Config::default()
        };
        let mut processor = Processor::new(&remote, session(), &config);
        let results = processor
            .upload_folder(dir.path(), "ghost", MediaFilter::Images, Privacy::Unlisted)
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ProcessingStatus::DryRun);
        assert_eq!(results[0].target.as_deref(), Some("Ghost"));
        assert!(processor.create_album("ghost", Privacy::Public).unwrap().is_none());
    }

    #[test]
    fn test_create_album_returns_album_with_url() {
        let mut remote = MockRemoteApi::new();
        remote.expect_list_albums().never();
        remote
            .expect_create_album()
            .times(1)
            .returning(|_, title, _| Ok(album(3, title)));
        remote.expect_album_info().times(1).returning(|_, _| {
            Ok(crate::model::AlbumDetails {
                url: Some("https://jdoe.example.com/Trip".into()),
            })
        });

        let processor = Processor::new(&remote, session(), &config());
        let created = processor.create_album("trip", Privacy::Unlisted).unwrap().unwrap();
        assert_eq!(created.title, "Trip");
        assert_eq!(created.url.as_deref(), Some("https://jdoe.example.com/Trip"));
    }

    #[test]
    fn test_download_album_filters_and_skips() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("have.jpg"), b"mine").unwrap();

        let mut remote = MockRemoteApi::new();
        remote.expect_list_albums().returning(|_| Ok(vec![album(1, "Party")]));
        remote.expect_list_images().times(1).returning(|_, _, _| {
            let mut locked = remote_item(3, "locked.jpg", "");
            locked.original_url = None;
            Ok(vec![
                remote_item(1, "have.jpg", ""),
                remote_item(2, "new.jpg", ""),
                remote_item(4, "clip.mov", ""),
                locked,
            ])
        });
        remote
            .expect_open_original()
            .withf(|_, url| url == "https://x/new.jpg")
            .times(1)
            .returning(|_, _| Ok(Box::new(Cursor::new(b"fresh".to_vec())) as Box<dyn Read>));
        remote
            .expect_image_info()
            .returning(|_, _| Ok(crate::model::ImageInfo { captured_at: None }));

        let mut processor = Processor::new(&remote, session(), &config());
        let results = processor
            .download_album("party", dir.path(), MediaFilter::Images)
            .unwrap();

        let statuses: Vec<_> = results.iter().map(|r| (r.source.as_str(), r.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("have.jpg", ProcessingStatus::Skipped),
                ("new.jpg", ProcessingStatus::Downloaded),
                ("locked.jpg", ProcessingStatus::Skipped),
            ]
        );
        assert_eq!(fs::read(dir.path().join("have.jpg")).unwrap(), b"mine");
        assert_eq!(fs::read(dir.path().join("new.jpg")).unwrap(), b"fresh");
    }

    #[test]
    fn test_download_missing_album_is_not_found() {
        let mut remote = MockRemoteApi::new();
        remote.expect_list_albums().returning(|_| Ok(vec![album(1, "Other")]));
        remote.expect_list_images().never();

        let dir = tempdir().unwrap();
        let mut processor = Processor::new(&remote, session(), &config());
        let err = processor
            .download_album("Missing", dir.path(), MediaFilter::All)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_clear_duplicates_deletes_later_occurrences() {
        let deleted = Arc::new(Mutex::new(Vec::new()));
        let sink = deleted.clone();

        let mut remote = MockRemoteApi::new();
        remote.expect_list_albums().returning(|_| Ok(vec![album(1, "Dupes")]));
        remote.expect_list_images().returning(|_, _, _| {
            Ok(["A", "B", "A", "A", "C", "B"]
                .iter()
                .enumerate()
                .map(|(i, d)| remote_item(i as i64, &format!("{}.jpg", i), d))
                .collect())
        });
        remote.expect_delete_image().times(3).returning(move |_, image| {
            sink.lock().unwrap().push(image.id);
            if image.id == 3 {
                Err(Error::Transfer("timeout".into()))
            } else {
                Ok(())
            }
        });

        let mut processor = Processor::new(&remote, session(), &config());
        let results = processor.clear_duplicates("dupes").unwrap();

        assert_eq!(*deleted.lock().unwrap(), vec![2, 3, 5]);
        let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ProcessingStatus::Deleted,
                ProcessingStatus::Failed,
                ProcessingStatus::Deleted
            ]
        );
    }

    #[test]
    fn test_login_builds_session() {
        let mut remote = MockRemoteApi::new();
        remote
            .expect_login()
            .withf(|email, password| email == "me@example.com" && password == "secret")
            .returning(|_, _| Ok(session()));

        let processor = Processor::login(&remote, "me@example.com", "secret", &config()).unwrap();
        assert_eq!(processor.session().nickname, "jdoe");
    }

    #[test]
    fn test_login_failure_propagates() {
        let mut remote = MockRemoteApi::new();
        remote
            .expect_login()
            .returning(|_, _| Err(Error::Auth("invalid login".into())));

        assert!(matches!(
            Processor::login(&remote, "me@example.com", "wrong", &config()),
            Err(Error::Auth(_))
        ));
    }
}
