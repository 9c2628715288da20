//! Platform publisher implementations and registry wiring.
//!
//! Each submodule implements [`crosspost_core::contract::Publisher`] for one
//! platform against its real HTTP API. [`build_registry`] turns the resolved
//! credentials into a registry: a platform with no credentials at all simply
//! gets no publisher, so a run that targets it reports `UnknownPlatform`
//! instead of attempting a doomed upload.

use std::path::Path;

use tracing::info;

use crosspost_core::contract::PublisherRegistry;

use crate::load_config::PlatformCredentials;

pub mod facebook;
pub mod instagram;
pub mod tiktok;
pub mod youtube;

use facebook::FacebookPublisher;
use instagram::InstagramPublisher;
use tiktok::TikTokPublisher;
use youtube::YouTubePublisher;

/// Builds the registry of publishers for every configured platform.
pub fn build_registry(credentials: &PlatformCredentials) -> PublisherRegistry {
    let mut registry = PublisherRegistry::new();
    if let Some(creds) = &credentials.facebook {
        registry.register("facebook", Box::new(FacebookPublisher::new(creds.clone())));
    }
    if let Some(creds) = &credentials.youtube {
        registry.register("youtube", Box::new(YouTubePublisher::new(creds.clone())));
    }
    if let Some(creds) = &credentials.instagram {
        registry.register(
            "instagram",
            Box::new(InstagramPublisher::new(creds.clone())),
        );
    }
    if let Some(creds) = &credentials.tiktok {
        registry.register("tiktok", Box::new(TikTokPublisher::new(creds.clone())));
    }
    info!(platforms = ?registry.names(), "Registered platform publishers");
    registry
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
