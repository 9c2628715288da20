//! Immutable runtime configuration for the pipeline.
//!
//! Components receive these values at construction and never re-read them
//! mid-run. Resolution of the YAML file and environment overrides happens in
//! the CLI crate; this module only defines the resolved shapes and the
//! built-in defaults used when a source is absent.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::media::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};

/// Keywords rejected in file names and captions when no list is configured.
pub const DEFAULT_BANNED_KEYWORDS: &[&str] =
    &["hate", "violence", "nude", "spam", "scam", "terror"];

/// Upper bound on media file size when no limit is configured.
pub const DEFAULT_MAX_FILE_SIZE_MB: f64 = 100.0;

/// Content policy applied to every media item before publishing.
///
/// Keyword and format sets are kept ordered so that scan results are
/// deterministic when several entries could match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub banned_keywords: BTreeSet<String>,
    pub allowed_video_formats: BTreeSet<String>,
    pub allowed_image_formats: BTreeSet<String>,
    pub max_file_size_mb: f64,
}

impl PolicyConfig {
    /// Builds a policy from optional configured values, falling back to the
    /// built-in defaults for anything absent.
    ///
    /// Entries are lower-cased and trimmed; empty entries are dropped. An
    /// explicitly configured empty format list is honoured (nothing of that
    /// kind passes), but an empty banned-keyword list falls back to the
    /// defaults so a blank config line cannot disable keyword screening.
    pub fn new(
        banned_keywords: Option<Vec<String>>,
        allowed_video_formats: Option<Vec<String>>,
        allowed_image_formats: Option<Vec<String>>,
        max_file_size_mb: Option<f64>,
    ) -> Self {
        let banned = match banned_keywords.map(normalise) {
            Some(set) if !set.is_empty() => set,
            _ => normalise(defaults(DEFAULT_BANNED_KEYWORDS)),
        };
        let video = match allowed_video_formats.map(normalise) {
            Some(set) => set,
            None => normalise(defaults(VIDEO_EXTENSIONS)),
        };
        let image = match allowed_image_formats.map(normalise) {
            Some(set) => set,
            None => normalise(defaults(IMAGE_EXTENSIONS)),
        };
        let max_mb = max_file_size_mb.unwrap_or(DEFAULT_MAX_FILE_SIZE_MB);

        PolicyConfig {
            banned_keywords: banned,
            allowed_video_formats: video,
            allowed_image_formats: image,
            max_file_size_mb: max_mb,
        }
    }

    /// True when the (lower-cased) extension is an allowed video or image
    /// format under this policy.
    pub fn is_allowed_format(&self, extension: &str) -> bool {
        let ext = extension.trim().to_lowercase();
        self.allowed_video_formats.contains(&ext) || self.allowed_image_formats.contains(&ext)
    }

    /// Returns the first banned keyword contained in `text`, matching
    /// case-insensitively and inside larger words. Iteration order is the
    /// set's lexicographic order, so the result is deterministic.
    pub fn matched_keyword(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.banned_keywords
            .iter()
            .find(|keyword| haystack.contains(keyword.as_str()))
            .map(String::as_str)
    }

    pub fn trace_loaded(&self) {
        info!(
            banned_keywords = self.banned_keywords.len(),
            video_formats = self.allowed_video_formats.len(),
            image_formats = self.allowed_image_formats.len(),
            max_file_size_mb = self.max_file_size_mb,
            "Loaded content policy"
        );
        debug!(?self, "Content policy (full debug)");
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig::new(None, None, None, None)
    }
}

fn defaults(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn normalise(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Filesystem layout the pipeline works against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Watched directory holding media and sidecar caption files.
    pub input: PathBuf,
    /// Destination for items published to at least one platform.
    pub processed: PathBuf,
    /// Destination for items rejected by the compliance gate.
    pub quarantine: PathBuf,
    /// Destination for compliant items rejected by every platform.
    pub failed: PathBuf,
}

impl DirectoryConfig {
    pub fn trace_loaded(&self) {
        info!(
            input = %self.input.display(),
            processed = %self.processed.display(),
            quarantine = %self.quarantine.display(),
            failed = %self.failed.display(),
            "Loaded directory layout"
        );
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        DirectoryConfig {
            input: PathBuf::from("media/input"),
            processed: PathBuf::from("media/processed"),
            quarantine: PathBuf::from("media/quarantine"),
            failed: PathBuf::from("media/failed"),
        }
    }
}
