//! `load_config` module: Loads and adapts a static YAML config, including
//! environment overrides for policy values and platform credentials, into the
//! resolved settings the CLI hands to the core pipeline.
//!
//! This module is the only place where untrusted YAML and environment
//! variables are parsed and mapped to rich, strongly-typed internal structs.
//!
//! # Responsibilities
//! - Parse the user-supplied YAML configuration file into type-safe sections
//! - Resolve each section against built-in defaults: a missing file, a
//!   malformed file or a missing key never aborts a run, it degrades to the
//!   defaults with a logged warning
//! - Apply environment overrides (`CROSSPOST_*` for policy values, the
//!   platform variables for credentials); the environment wins over the file
//! - Acts as the adapter layer decoupling input schemas from the domain core
//!
//! # Precedence
//! Environment variable, then config file, then built-in default.
//!
//! # Extension Guidance
//! - To add a config key: extend the matching `*Section` struct, resolve it in
//!   [`load_config`] and surface it on [`LoadedConfig`]
//! - To add a platform: add a credentials section here and a publisher module
//!   under `platforms/`
//!
//! For the accepted YAML schema, see the README.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crosspost_core::config::{DirectoryConfig, PolicyConfig};

use crate::platforms::facebook::FacebookCredentials;
use crate::platforms::instagram::InstagramCredentials;
use crate::platforms::tiktok::TikTokCredentials;
use crate::platforms::youtube::YouTubeCredentials;

/// Seconds a single publish attempt may take before the pipeline gives up on it.
pub const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    policies: PoliciesSection,
    #[serde(default)]
    directories: DirectoriesSection,
    #[serde(default)]
    publish: PublishSection,
    #[serde(default)]
    platforms: PlatformsSection,
}

#[derive(Debug, Default, Deserialize)]
struct PoliciesSection {
    banned_keywords: Option<Vec<String>>,
    allowed_video_formats: Option<Vec<String>>,
    allowed_image_formats: Option<Vec<String>>,
    max_file_size_mb: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoriesSection {
    input: Option<PathBuf>,
    processed: Option<PathBuf>,
    quarantine: Option<PathBuf>,
    failed: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct PublishSection {
    targets: Option<Vec<String>>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PlatformsSection {
    facebook: Option<FacebookSection>,
    youtube: Option<YouTubeSection>,
    instagram: Option<InstagramSection>,
    tiktok: Option<TikTokSection>,
}

#[derive(Debug, Default, Deserialize)]
struct FacebookSection {
    page_id: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YouTubeSection {
    access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InstagramSection {
    user_id: Option<String>,
    access_token: Option<String>,
    media_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TikTokSection {
    access_token: Option<String>,
}

/// Credentials for every platform the operator has configured, from the
/// config file or the environment. `None` means the platform is not
/// configured at all and gets no publisher.
#[derive(Default)]
pub struct PlatformCredentials {
    pub facebook: Option<FacebookCredentials>,
    pub youtube: Option<YouTubeCredentials>,
    pub instagram: Option<InstagramCredentials>,
    pub tiktok: Option<TikTokCredentials>,
}

/// Fully resolved settings for one CLI invocation.
pub struct LoadedConfig {
    pub policy: PolicyConfig,
    pub directories: DirectoryConfig,
    /// Configured target platforms; empty means "every registered publisher".
    pub targets: Vec<String>,
    pub publish_timeout: Duration,
    pub platforms: PlatformCredentials,
}

impl LoadedConfig {
    pub fn trace_loaded(&self) {
        self.policy.trace_loaded();
        self.directories.trace_loaded();
        info!(
            targets = ?self.targets,
            timeout_secs = self.publish_timeout.as_secs(),
            facebook = self.platforms.facebook.is_some(),
            youtube = self.platforms.youtube.is_some(),
            instagram = self.platforms.instagram.is_some(),
            tiktok = self.platforms.tiktok.is_some(),
            "Loaded publish settings"
        );
    }
}

/// Loads the YAML config at `path` and resolves it with environment
/// overrides. Always returns a usable config: problems are logged and the
/// affected values fall back to defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> LoadedConfig {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let raw = match fs::read_to_string(path_ref) {
        Ok(content) => match serde_yaml::from_str::<RawConfig>(&content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                warn!(
                    error = ?e,
                    config_path = ?path_ref,
                    "Failed to parse config YAML; continuing with defaults"
                );
                RawConfig::default()
            }
        },
        Err(e) => {
            warn!(
                error = ?e,
                config_path = ?path_ref,
                "Config file not readable; continuing with defaults"
            );
            RawConfig::default()
        }
    };

    let policy = PolicyConfig::new(
        env_list("CROSSPOST_BANNED_KEYWORDS").or(raw.policies.banned_keywords),
        env_list("CROSSPOST_ALLOWED_VIDEO_FORMATS").or(raw.policies.allowed_video_formats),
        env_list("CROSSPOST_ALLOWED_IMAGE_FORMATS").or(raw.policies.allowed_image_formats),
        env_f64("CROSSPOST_MAX_FILE_SIZE_MB").or(raw.policies.max_file_size_mb),
    );

    let defaults = DirectoryConfig::default();
    let directories = DirectoryConfig {
        input: raw.directories.input.unwrap_or(defaults.input),
        processed: raw.directories.processed.unwrap_or(defaults.processed),
        quarantine: raw.directories.quarantine.unwrap_or(defaults.quarantine),
        failed: raw.directories.failed.unwrap_or(defaults.failed),
    };

    let targets = raw.publish.targets.unwrap_or_default();
    let publish_timeout = Duration::from_secs(
        raw.publish
            .timeout_secs
            .unwrap_or(DEFAULT_PUBLISH_TIMEOUT_SECS),
    );

    let platforms = PlatformCredentials {
        facebook: facebook_credentials(raw.platforms.facebook.as_ref()),
        youtube: youtube_credentials(raw.platforms.youtube.as_ref()),
        instagram: instagram_credentials(raw.platforms.instagram.as_ref()),
        tiktok: tiktok_credentials(raw.platforms.tiktok.as_ref()),
    };

    LoadedConfig {
        policy,
        directories,
        targets,
        publish_timeout,
        platforms,
    }
}

fn facebook_credentials(section: Option<&FacebookSection>) -> Option<FacebookCredentials> {
    let page_id = env_string("FACEBOOK_PAGE_ID").or_else(|| section?.page_id.clone());
    let access_token = env_string("FACEBOOK_ACCESS_TOKEN").or_else(|| section?.access_token.clone());
    if section.is_none() && page_id.is_none() && access_token.is_none() {
        return None;
    }
    Some(FacebookCredentials {
        page_id: page_id.unwrap_or_default(),
        access_token: access_token.unwrap_or_default(),
    })
}

fn youtube_credentials(section: Option<&YouTubeSection>) -> Option<YouTubeCredentials> {
    let access_token = env_string("YOUTUBE_ACCESS_TOKEN").or_else(|| section?.access_token.clone());
    if section.is_none() && access_token.is_none() {
        return None;
    }
    Some(YouTubeCredentials {
        access_token: access_token.unwrap_or_default(),
    })
}

fn instagram_credentials(section: Option<&InstagramSection>) -> Option<InstagramCredentials> {
    let user_id = env_string("INSTAGRAM_USER_ID").or_else(|| section?.user_id.clone());
    let access_token =
        env_string("INSTAGRAM_ACCESS_TOKEN").or_else(|| section?.access_token.clone());
    let media_base_url =
        env_string("INSTAGRAM_MEDIA_BASE_URL").or_else(|| section?.media_base_url.clone());
    if section.is_none() && user_id.is_none() && access_token.is_none() && media_base_url.is_none()
    {
        return None;
    }
    Some(InstagramCredentials {
        user_id: user_id.unwrap_or_default(),
        access_token: access_token.unwrap_or_default(),
        media_base_url: media_base_url.unwrap_or_default(),
    })
}

fn tiktok_credentials(section: Option<&TikTokSection>) -> Option<TikTokCredentials> {
    let access_token = env_string("TIKTOK_ACCESS_TOKEN").or_else(|| section?.access_token.clone());
    if section.is_none() && access_token.is_none() {
        return None;
    }
    Some(TikTokCredentials {
        access_token: access_token.unwrap_or_default(),
    })
}

/// Comma-separated list from the environment. A set-but-empty variable yields
/// an empty list, which for format lists means "allow nothing".
fn env_list(name: &str) -> Option<Vec<String>> {
    let raw = env::var(name).ok()?;
    Some(
        raw.split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
    )
}

fn env_f64(name: &str) -> Option<f64> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                error = ?e,
                variable = name,
                raw = %raw,
                "Environment override is not a number; ignoring it"
            );
            None
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
