//! # contract: Universal interface for platform publishers
//!
//! This module defines a single trait (`Publisher`) and the concrete
//! supporting types for pushing one media file to a social platform
//! (Facebook, YouTube, Instagram, TikTok, or a mock/test implementation).
//!
//! ## Interface & Extensibility
//! - Implement the [`Publisher`] trait to add a platform client.
//! - `publish` is async and returns a typed [`PublishError`] instead of
//!   panicking or logging-and-swallowing; the pipeline converts errors into
//!   per-platform [`PublishOutcome`] values and carries on.
//! - `validate_credentials` is a cheap shape check (are the required fields
//!   present?); `authenticate` actually exercises the remote API.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests.
//!
//! ## Adding New Platforms
//! - Implement the trait for your client and register it in a
//!   [`PublisherRegistry`] under the platform name used in configuration.
//! - Convert all upstream errors to a meaningful [`PublishError`] variant.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;

use crate::media::MediaKind;

/// The data a publisher needs for one upload: where the file is, what kind
/// of media it is, and the caption to attach.
pub struct PublishRequest<'a> {
    pub path: &'a Path,
    pub kind: MediaKind,
    pub caption: &'a str,
}

/// Returned by a publisher on success.
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    /// Platform-assigned identifier of the created post.
    pub post_id: String,
}

/// Typed failure of a single publish attempt.
///
/// `UnknownPlatform` is never produced by a publisher itself; the pipeline
/// uses it when a configured target has no registered client.
#[derive(Debug)]
pub enum PublishError {
    MissingCredentials(String),
    Api(String),
    Io(std::io::Error),
    UnsupportedMedia(String),
    Timeout(u64),
    UnknownPlatform(String),
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishError::MissingCredentials(msg) => write!(f, "MissingCredentials: {msg}"),
            PublishError::Api(msg) => write!(f, "PublisherError: {msg}"),
            PublishError::Io(e) => write!(f, "IOError: {e}"),
            PublishError::UnsupportedMedia(msg) => write!(f, "UnsupportedMedia: {msg}"),
            PublishError::Timeout(secs) => {
                write!(f, "Timeout: publish did not complete within {secs}s")
            }
            PublishError::UnknownPlatform(name) => {
                write!(f, "UnknownPlatform: no publisher registered for '{name}'")
            }
        }
    }
}

impl std::error::Error for PublishError {}

impl From<std::io::Error> for PublishError {
    fn from(e: std::io::Error) -> Self {
        PublishError::Io(e)
    }
}

/// Per-platform result of one publish attempt, as recorded in the run report.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub platform: String,
    pub success: bool,
    pub post_id: Option<String>,
    pub error: Option<String>,
}

impl PublishOutcome {
    pub fn succeeded(platform: &str, post_id: String) -> PublishOutcome {
        PublishOutcome {
            platform: platform.to_string(),
            success: true,
            post_id: Some(post_id),
            error: None,
        }
    }

    pub fn failed(platform: &str, error: String) -> PublishOutcome {
        PublishOutcome {
            platform: platform.to_string(),
            success: false,
            post_id: None,
            error: Some(error),
        }
    }
}

/// Trait for publishing media items to one social platform.
/// The implementor is responsible for connecting to the platform API.
///
/// The trait is implemented by real clients and by test mocks. It is
/// `Send` + `Sync` and intended for async/await usage behind a trait object.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Upload one media file with its caption, returning the platform's post
    /// id on success.
    async fn publish<'a>(&self, request: PublishRequest<'a>)
        -> Result<PublishReceipt, PublishError>;

    /// True when every credential field the platform needs is present.
    /// Performs no I/O.
    fn validate_credentials(&self) -> bool;

    /// Exercises the platform API with the configured credentials and reports
    /// whether it accepted them.
    async fn authenticate(&self) -> bool;
}

/// Name-keyed collection of the publishers available to a run.
///
/// Names are lower-cased on registration and lookup, so config files may
/// spell platforms in any case. Iteration order is lexicographic, which keeps
/// reports and logs stable across runs.
#[derive(Default)]
pub struct PublisherRegistry {
    publishers: BTreeMap<String, Box<dyn Publisher>>,
}

impl PublisherRegistry {
    pub fn new() -> PublisherRegistry {
        PublisherRegistry {
            publishers: BTreeMap::new(),
        }
    }

    /// Registers a publisher under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, publisher: Box<dyn Publisher>) {
        self.publishers.insert(name.to_lowercase(), publisher);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Publisher> {
        self.publishers.get(&name.to_lowercase()).map(Box::as_ref)
    }

    pub fn names(&self) -> Vec<String> {
        self.publishers.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Publisher)> {
        self.publishers
            .iter()
            .map(|(name, publisher)| (name.as_str(), publisher.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}
