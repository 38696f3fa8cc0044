//! Uploads and downloads of individual items
//!
//! Uploads are retried a bounded number of times on transient failures.
//! Downloads never overwrite: an existing target file means the item was
//! already fetched by an earlier run.

use crate::error::{Error, Result};
use crate::model::{Album, LocalItem, RemoteItem, Session};
use crate::remote::RemoteApi;
use chrono::{Local, NaiveDateTime, TimeZone};
use filetime::FileTime;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Bounded retry of an operation that may fail transiently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

impl RetryPolicy {
    /// Allow up to `max_attempts` calls (at least one)
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    ///
    /// `op` receives the 1-based attempt number. On success the number of
    /// attempts used is returned alongside the value; otherwise the last
    /// error.
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<(T, u32)>
    where
        F: FnMut(u32) -> Result<T>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok((value, attempt)),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "retry {}",
                        label
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Result of an upload that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Stored remotely after the given number of attempts
    Uploaded { attempts: u32 },
    /// Dry run, nothing sent
    Planned,
}

/// Result of a download that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Written to the given path
    Downloaded(PathBuf),
    /// Target already present, left untouched
    Exists(PathBuf),
    /// The account may not fetch the original
    NoPermission,
    /// Dry run, would be written to the given path
    Planned(PathBuf),
}

/// Moves content between local folders and remote albums
pub struct TransferEngine<'a> {
    remote: &'a dyn RemoteApi,
    session: &'a Session,
    retry: RetryPolicy,
    dry_run: bool,
}

impl<'a> TransferEngine<'a> {
    pub fn new(
        remote: &'a dyn RemoteApi,
        session: &'a Session,
        retry: RetryPolicy,
        dry_run: bool,
    ) -> Self {
        Self {
            remote,
            session,
            retry,
            dry_run,
        }
    }

    /// Upload one local file into `album`
    ///
    /// `digest` is the content digest the file was hashed to during
    /// deduplication; every attempt reuses it. Transient failures are
    /// retried under the engine's [`RetryPolicy`]. The error of the final
    /// attempt is returned for the caller to record; it should not end the
    /// batch.
    pub fn upload(&self, album: &Album, item: &LocalItem, digest: &str) -> Result<UploadOutcome> {
        if self.dry_run {
            info!(path = %item.path.display(), album = %album.title, "Would upload file");
            return Ok(UploadOutcome::Planned);
        }

        let label = item.path.display().to_string();
        let ((), attempts) = self.retry.run(&label, |_| {
            self.remote
                .upload_image(self.session, album, &item.path, digest, &item.metadata)
        })?;
        debug!(path = %label, attempts, "Upload complete");
        Ok(UploadOutcome::Uploaded { attempts })
    }

    /// Download one remote item into `dest_folder`
    ///
    /// Items without an original URL and items whose target file exists
    /// are skipped. After writing, the file's timestamps are set to the
    /// capture time when one is known.
    pub fn download(&self, item: &RemoteItem, dest_folder: &Path) -> Result<DownloadOutcome> {
        let Some(url) = item.original_url.as_deref() else {
            warn!(
                file = %item.file_name,
                "no permission to download {}...skipping",
                item.file_name
            );
            return Ok(DownloadOutcome::NoPermission);
        };

        let target = dest_folder.join(safe_file_name(&item.file_name)?);
        if target.exists() {
            info!(path = %target.display(), "{} already exists...skipping", target.display());
            return Ok(DownloadOutcome::Exists(target));
        }

        if self.dry_run {
            info!(url, path = %target.display(), "Would download file");
            return Ok(DownloadOutcome::Planned(target));
        }

        fs::create_dir_all(dest_folder)?;
        let partial = partial_path(&target);
        if let Err(e) = self.stream_to(url, &partial) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, &target)?;

        self.apply_capture_time(item, &target);
        Ok(DownloadOutcome::Downloaded(target))
    }

    fn stream_to(&self, url: &str, path: &Path) -> Result<u64> {
        let mut reader = self.remote.open_original(self.session, url)?;
        let mut writer = BufWriter::with_capacity(256 * 1024, File::create(path)?);
        let written = io::copy(&mut reader, &mut writer)?;
        writer.flush()?;
        debug!(url, path = %path.display(), bytes = written, "Streamed remote content");
        Ok(written)
    }

    /// Best-effort: a missing or unreadable capture time leaves the file as written
    fn apply_capture_time(&self, item: &RemoteItem, path: &Path) {
        let captured_at = match item.captured_at {
            Some(time) => Some(time),
            None => match self.remote.image_info(self.session, &item.key) {
                Ok(info) => info.captured_at,
                Err(e) => {
                    warn!(file = %item.file_name, error = %e, "Could not look up capture time");
                    None
                }
            },
        };

        let Some(file_time) = captured_at.and_then(local_file_time) else {
            debug!(file = %item.file_name, "No capture time, keeping download time");
            return;
        };

        if let Err(e) = filetime::set_file_times(path, file_time, file_time) {
            warn!(path = %path.display(), error = %e, "Failed to set file timestamp");
        }
    }
}

/// Interpret a capture time in the local time zone
fn local_file_time(time: NaiveDateTime) -> Option<FileTime> {
    let local = Local.from_local_datetime(&time).earliest()?;
    Some(FileTime::from_unix_time(local.timestamp(), 0))
}

/// Reject remote names that would escape the destination folder
fn safe_file_name(name: &str) -> Result<&str> {
    match Path::new(name).file_name().and_then(|n| n.to_str()) {
        Some(plain) if plain == name => Ok(name),
        _ => Err(Error::FileName(name.to_string())),
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}
