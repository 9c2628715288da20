use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use crosspost_core::compliance::ComplianceChecker;
use crosspost_core::config::PolicyConfig;
use crosspost_core::media::MediaItem;

const PLATFORMS: &[&str] = &["facebook", "instagram", "tiktok", "youtube"];

fn write_media(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, vec![0u8; len]).expect("test media file should be writable");
    path
}

fn default_checker() -> ComplianceChecker {
    ComplianceChecker::new(PolicyConfig::default())
}

#[test]
fn test_compliant_video_passes_for_every_platform() {
    let dir = tempdir().unwrap();
    let path = write_media(dir.path(), "promo.mp4", 1_000);
    let item = MediaItem::from_path(&path);
    let checker = default_checker();

    for platform in PLATFORMS {
        let result = checker.check_media_compliance(&item, platform);
        assert!(
            result.compliant,
            "A small mp4 should be compliant for {platform}, got: {}",
            result.reason
        );
        assert_eq!(
            result.reason,
            format!("{platform} policies satisfied"),
            "Pass reason should name the platform"
        );
    }
}

#[test]
fn test_missing_file_is_rejected_as_not_found() {
    let dir = tempdir().unwrap();
    let item = MediaItem::from_path(&dir.path().join("ghost.mp4"));
    let result = default_checker().check_media_compliance(&item, "facebook");

    assert!(!result.compliant, "A missing file must not be compliant");
    assert!(
        result.reason.starts_with("NotFound"),
        "Reason should carry the NotFound class, got: {}",
        result.reason
    );
}

#[test]
fn test_unrecognised_extension_is_rejected_as_unsupported_format() {
    let dir = tempdir().unwrap();
    let path = write_media(dir.path(), "clip.xyz", 100);
    let item = MediaItem::from_path(&path);

    for platform in PLATFORMS {
        let result = default_checker().check_media_compliance(&item, platform);
        assert!(
            !result.compliant,
            "An unrecognised extension must fail for {platform}"
        );
        assert!(
            result.reason.contains("UnsupportedFormat") && result.reason.contains("'xyz'"),
            "Reason should name the class and the extension, got: {}",
            result.reason
        );
    }
}

#[test]
fn test_file_without_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let path = write_media(dir.path(), "clip", 100);
    let item = MediaItem::from_path(&path);
    let result = default_checker().check_media_compliance(&item, "youtube");

    assert!(!result.compliant, "A file with no extension must not pass");
    assert!(
        result.reason.starts_with("UnsupportedFormat"),
        "Reason should carry the UnsupportedFormat class, got: {}",
        result.reason
    );
}

#[test]
fn test_uppercase_extension_is_allowed() {
    let dir = tempdir().unwrap();
    let path = write_media(dir.path(), "PROMO.MP4", 1_000);
    let item = MediaItem::from_path(&path);
    let result = default_checker().check_media_compliance(&item, "tiktok");

    assert!(
        result.compliant,
        "Extension matching must be case-insensitive, got: {}",
        result.reason
    );
}

#[test]
fn test_oversize_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = write_media(dir.path(), "big.mp4", 2 * 1024 * 1024);
    let item = MediaItem::from_path(&path);
    let policy = PolicyConfig::new(None, None, None, Some(1.0));
    let result = ComplianceChecker::new(policy).check_media_compliance(&item, "facebook");

    assert!(!result.compliant, "A 2 MB file must fail a 1 MB limit");
    assert!(
        result.reason.contains("SizeExceeded") && result.reason.contains("limit is 1.00 MB"),
        "Reason should name the class and the limit, got: {}",
        result.reason
    );
}

#[test]
fn test_size_check_precedes_keyword_scan() {
    let dir = tempdir().unwrap();
    let path = write_media(dir.path(), "hate_big.mp4", 2 * 1024 * 1024);
    let item = MediaItem::from_path(&path);
    let policy = PolicyConfig::new(None, None, None, Some(1.0));
    let result = ComplianceChecker::new(policy).check_media_compliance(&item, "facebook");

    assert!(
        result.reason.starts_with("SizeExceeded"),
        "An oversize file with a banned name should report the size first, got: {}",
        result.reason
    );
}

#[test]
fn test_banned_keyword_in_filename_any_case() {
    let dir = tempdir().unwrap();
    let path = write_media(dir.path(), "HATE_rally.jpg", 100);
    let item = MediaItem::from_path(&path);
    let result = default_checker().check_media_compliance(&item, "instagram");

    assert!(!result.compliant, "A banned word in the name must fail");
    assert!(
        result.reason.contains("BannedKeyword")
            && result.reason.contains("filename")
            && result.reason.contains("'hate'"),
        "Reason should name the class, location and keyword, got: {}",
        result.reason
    );
}

#[test]
fn test_banned_keyword_matches_inside_larger_words() {
    let dir = tempdir().unwrap();
    let path = write_media(dir.path(), "spamalot.mp4", 100);
    let item = MediaItem::from_path(&path);
    let result = default_checker().check_media_compliance(&item, "youtube");

    assert!(
        !result.compliant,
        "Keyword matching is substring-based, 'spamalot' contains 'spam'"
    );
    assert!(
        result.reason.contains("'spam'"),
        "Reason should quote the matched keyword, got: {}",
        result.reason
    );
}

#[test]
fn test_keyword_scan_reports_lexicographically_first_match() {
    let dir = tempdir().unwrap();
    let path = write_media(dir.path(), "scam_hate.mp4", 100);
    let item = MediaItem::from_path(&path);
    let result = default_checker().check_media_compliance(&item, "facebook");

    // Both 'scam' and 'hate' occur; the ordered keyword set makes the
    // reported match deterministic.
    assert!(
        result.reason.contains("'hate'"),
        "The lexicographically first keyword should be reported, got: {}",
        result.reason
    );
}

#[test]
fn test_banned_keyword_in_sidecar_caption() {
    let dir = tempdir().unwrap();
    let path = write_media(dir.path(), "promo.mp4", 100);
    fs::write(dir.path().join("promo.txt"), "Big SPAM sale this week").unwrap();
    let item = MediaItem::from_path(&path);
    let result = default_checker().check_media_compliance(&item, "facebook");

    assert!(!result.compliant, "A banned word in the caption must fail");
    assert!(
        result.reason.contains("caption") && result.reason.contains("'spam'"),
        "Reason should point at the caption and quote the keyword, got: {}",
        result.reason
    );
}

#[test]
fn test_caption_scan_skipped_without_sidecar() {
    let dir = tempdir().unwrap();
    let path = write_media(dir.path(), "promo.mp4", 100);
    let item = MediaItem::from_path(&path);
    let result = default_checker().check_media_compliance(&item, "facebook");

    assert!(
        result.compliant,
        "With no sidecar there is no caption text to scan, got: {}",
        result.reason
    );
}

#[test]
fn test_empty_banned_list_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = write_media(dir.path(), "hate_rally.jpg", 100);
    let item = MediaItem::from_path(&path);
    let policy = PolicyConfig::new(Some(vec![]), None, None, None);
    let result = ComplianceChecker::new(policy).check_media_compliance(&item, "facebook");

    assert!(
        !result.compliant,
        "An empty banned-keyword list must not disable keyword screening"
    );
}

#[test]
fn test_custom_keywords_replace_defaults() {
    let dir = tempdir().unwrap();
    let hate = MediaItem::from_path(&write_media(dir.path(), "hate_rally.jpg", 100));
    let crypto = MediaItem::from_path(&write_media(dir.path(), "crypto_pump.mp4", 100));
    let policy = PolicyConfig::new(Some(vec!["crypto".to_string()]), None, None, None);
    let checker = ComplianceChecker::new(policy);

    assert!(
        checker.check_media_compliance(&hate, "facebook").compliant,
        "Configured keywords replace the defaults, they do not merge"
    );
    assert!(
        !checker.check_media_compliance(&crypto, "facebook").compliant,
        "The configured keyword must be enforced"
    );
}

#[test]
fn test_configured_empty_video_formats_reject_videos() {
    let dir = tempdir().unwrap();
    let video = MediaItem::from_path(&write_media(dir.path(), "promo.mp4", 100));
    let image = MediaItem::from_path(&write_media(dir.path(), "photo.jpg", 100));
    let policy = PolicyConfig::new(None, Some(vec![]), None, None);
    let checker = ComplianceChecker::new(policy);

    let rejected = checker.check_media_compliance(&video, "youtube");
    assert!(
        !rejected.compliant,
        "An explicitly empty video-format list means no video passes"
    );
    assert!(
        rejected.reason.contains("UnsupportedFormat"),
        "Videos should fail the format gate, got: {}",
        rejected.reason
    );
    assert!(
        checker.check_media_compliance(&image, "youtube").compliant,
        "Image formats are configured separately and still pass"
    );
}
