//! # lifecycle: final disposition of media files after a pipeline decision
//!
//! A [`LifecycleManager`] owns the destination directories for a run and
//! moves each item exactly once:
//!
//! - `quarantine` for items rejected by the compliance gate, with a
//!   `<stem>_quarantine.log` record alongside explaining why,
//! - `processed` for items published to at least one platform,
//! - `failed` for compliant items every platform rejected, with a
//!   `<stem>_failed.log` record listing the per-platform errors.
//!
//! Sidecar caption files travel with their media file so the input directory
//! ends each run empty of handled items. Destination directories are created
//! on demand.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::DirectoryConfig;
use crate::contract::PublishOutcome;
use crate::media::MediaItem;

#[derive(Debug)]
pub enum LifecycleError {
    /// The media file was gone when the move was attempted.
    MissingSource(PathBuf),
    Io(io::Error),
}

impl std::fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleError::MissingSource(path) => {
                write!(f, "IOError: source file missing: {}", path.display())
            }
            LifecycleError::Io(e) => write!(f, "IOError: {e}"),
        }
    }
}

impl std::error::Error for LifecycleError {}

impl From<io::Error> for LifecycleError {
    fn from(e: io::Error) -> Self {
        LifecycleError::Io(e)
    }
}

/// Moves handled items out of the input directory and writes audit records.
pub struct LifecycleManager {
    processed_dir: PathBuf,
    quarantine_dir: PathBuf,
    failed_dir: PathBuf,
}

impl LifecycleManager {
    /// The directory layout is captured here once, at construction.
    pub fn new(directories: &DirectoryConfig) -> LifecycleManager {
        LifecycleManager {
            processed_dir: directories.processed.clone(),
            quarantine_dir: directories.quarantine.clone(),
            failed_dir: directories.failed.clone(),
        }
    }

    /// Moves a rejected item (and its sidecar) into quarantine and writes a
    /// `<stem>_quarantine.log` record naming the file, the time, the content
    /// hash and the rejection reason.
    pub fn quarantine(&self, item: &MediaItem, reason: &str) -> Result<(), LifecycleError> {
        let digest = self.content_digest(item);
        self.relocate(item, &self.quarantine_dir, "quarantine")?;

        let record = format!(
            "file: {}\nquarantined_at: {}\nsha256: {}\nreason: {}\n",
            item.file_name(),
            timestamp(),
            digest,
            reason,
        );
        let record_path = self
            .quarantine_dir
            .join(format!("{}_quarantine.log", item.stem()));
        fs::write(&record_path, record)?;
        info!(
            file = %item.file_name(),
            record = %record_path.display(),
            reason = %reason,
            "Quarantined media item"
        );
        Ok(())
    }

    /// Moves a published item (and its sidecar) into the processed directory.
    pub fn move_to_processed(&self, item: &MediaItem) -> Result<(), LifecycleError> {
        self.relocate(item, &self.processed_dir, "processed")
    }

    /// Moves a compliant item every platform rejected (and its sidecar) into
    /// the failed directory, with a `<stem>_failed.log` record listing each
    /// platform's error.
    pub fn move_to_failed(
        &self,
        item: &MediaItem,
        outcomes: &BTreeMap<String, PublishOutcome>,
    ) -> Result<(), LifecycleError> {
        let digest = self.content_digest(item);
        self.relocate(item, &self.failed_dir, "failed")?;

        let mut record = format!(
            "file: {}\nfailed_at: {}\nsha256: {}\n",
            item.file_name(),
            timestamp(),
            digest,
        );
        for (platform, outcome) in outcomes {
            let error = outcome.error.as_deref().unwrap_or("unknown error");
            record.push_str(&format!("{platform}: {error}\n"));
        }
        let record_path = self.failed_dir.join(format!("{}_failed.log", item.stem()));
        fs::write(&record_path, record)?;
        info!(
            file = %item.file_name(),
            record = %record_path.display(),
            "Recorded failed media item"
        );
        Ok(())
    }

    /// Moves the media file and its sidecar (when present) into `dest_dir`.
    fn relocate(
        &self,
        item: &MediaItem,
        dest_dir: &Path,
        bucket: &str,
    ) -> Result<(), LifecycleError> {
        if !item.path.is_file() {
            return Err(LifecycleError::MissingSource(item.path.clone()));
        }
        fs::create_dir_all(dest_dir)?;

        let dest = move_file(&item.path, dest_dir)?;
        info!(
            source = %item.path.display(),
            dest = %dest.display(),
            bucket = bucket,
            "Moved media file"
        );

        if let Some(sidecar) = &item.sidecar_path {
            if sidecar.is_file() {
                let dest = move_file(sidecar, dest_dir)?;
                info!(
                    source = %sidecar.display(),
                    dest = %dest.display(),
                    bucket = bucket,
                    "Moved sidecar caption"
                );
            }
        }
        Ok(())
    }

    /// SHA-256 of the media file for the audit record. Hash trouble is logged
    /// but never blocks the move itself.
    fn content_digest(&self, item: &MediaItem) -> String {
        match hash_file(&item.path) {
            Ok(digest) => digest,
            Err(e) => {
                warn!(
                    error = ?e,
                    path = %item.path.display(),
                    "Could not hash media file for audit record"
                );
                "unavailable".to_string()
            }
        }
    }
}

/// Renames `src` into `dest_dir`, falling back to copy-and-delete when the
/// rename fails (for example across filesystems). A stale file of the same
/// name at the destination is overwritten.
fn move_file(src: &Path, dest_dir: &Path) -> Result<PathBuf, LifecycleError> {
    let file_name = src
        .file_name()
        .ok_or_else(|| LifecycleError::MissingSource(src.to_path_buf()))?;
    let dest = dest_dir.join(file_name);
    if fs::rename(src, &dest).is_err() {
        fs::copy(src, &dest)?;
        fs::remove_file(src)?;
    }
    Ok(dest)
}

fn hash_file(path: &Path) -> Result<String, io::Error> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
