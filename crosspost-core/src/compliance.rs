//! # compliance: content-policy gate applied before any publish attempt
//!
//! One [`ComplianceChecker`] holds the immutable [`PolicyConfig`] for a run
//! and evaluates media items against it. Checks run in a fixed order and the
//! first violation wins:
//!
//! 1. the file exists on disk,
//! 2. its extension is an allowed video or image format,
//! 3. its size is within the configured limit,
//! 4. its file name (extension aside) contains no banned keyword,
//! 5. its sidecar caption text contains no banned keyword.
//!
//! Results are plain values; a violation is not an error. Callers decide what
//! to do with non-compliant items (the pipeline quarantines them).

use std::fs;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PolicyConfig;
use crate::media::MediaItem;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Where a banned keyword was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordLocation {
    Filename,
    Caption,
}

impl std::fmt::Display for KeywordLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeywordLocation::Filename => write!(f, "filename"),
            KeywordLocation::Caption => write!(f, "caption"),
        }
    }
}

/// A single failed policy check. The `Display` form is the reason string
/// recorded in reports and quarantine records, prefixed with the violation
/// class.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyViolation {
    NotFound,
    UnsupportedFormat { extension: String },
    SizeExceeded { size_mb: f64, limit_mb: f64 },
    BannedKeyword { keyword: String, location: KeywordLocation },
}

impl std::fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyViolation::NotFound => {
                write!(f, "NotFound: file does not exist on disk")
            }
            PolicyViolation::UnsupportedFormat { extension } => write!(
                f,
                "UnsupportedFormat: extension '{extension}' is not an allowed video or image format"
            ),
            PolicyViolation::SizeExceeded { size_mb, limit_mb } => write!(
                f,
                "SizeExceeded: file is {size_mb:.2} MB, limit is {limit_mb:.2} MB"
            ),
            PolicyViolation::BannedKeyword { keyword, location } => write!(
                f,
                "BannedKeyword: {location} contains banned keyword '{keyword}'"
            ),
        }
    }
}

/// Outcome of checking one item for one platform.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceResult {
    pub compliant: bool,
    /// `"<platform> policies satisfied"` on pass, otherwise the violation's
    /// class-prefixed description.
    pub reason: String,
}

/// Evaluates media items against a fixed content policy.
pub struct ComplianceChecker {
    policy: PolicyConfig,
}

impl ComplianceChecker {
    /// The policy is captured here once; later config changes never affect an
    /// existing checker.
    pub fn new(policy: PolicyConfig) -> ComplianceChecker {
        ComplianceChecker { policy }
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Checks `item` against the policy on behalf of `platform`.
    ///
    /// The platform only influences the wording of the pass reason; the policy
    /// itself is platform-independent.
    pub fn check_media_compliance(&self, item: &MediaItem, platform: &str) -> ComplianceResult {
        match self.evaluate(item) {
            Ok(()) => {
                debug!(
                    file = %item.file_name(),
                    platform = platform,
                    "Media item passed all policy checks"
                );
                ComplianceResult {
                    compliant: true,
                    reason: format!("{platform} policies satisfied"),
                }
            }
            Err(violation) => {
                let reason = violation.to_string();
                warn!(
                    file = %item.file_name(),
                    platform = platform,
                    reason = %reason,
                    "Media item violates content policy"
                );
                ComplianceResult {
                    compliant: false,
                    reason,
                }
            }
        }
    }

    fn evaluate(&self, item: &MediaItem) -> Result<(), PolicyViolation> {
        if !item.path.is_file() {
            return Err(PolicyViolation::NotFound);
        }

        let extension = item.extension();
        if !self.policy.is_allowed_format(&extension) {
            return Err(PolicyViolation::UnsupportedFormat { extension });
        }

        // The file can disappear between the existence check and here; treat
        // that the same as never having existed.
        let metadata = fs::metadata(&item.path).map_err(|_| PolicyViolation::NotFound)?;
        let size_mb = metadata.len() as f64 / BYTES_PER_MB;
        if size_mb > self.policy.max_file_size_mb {
            return Err(PolicyViolation::SizeExceeded {
                size_mb,
                limit_mb: self.policy.max_file_size_mb,
            });
        }

        if let Some(keyword) = self.policy.matched_keyword(&item.stem()) {
            return Err(PolicyViolation::BannedKeyword {
                keyword: keyword.to_string(),
                location: KeywordLocation::Filename,
            });
        }

        if let Some(caption) = &item.caption {
            if let Some(keyword) = self.policy.matched_keyword(caption) {
                return Err(PolicyViolation::BannedKeyword {
                    keyword: keyword.to_string(),
                    location: KeywordLocation::Caption,
                });
            }
        }

        Ok(())
    }
}
