use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tempfile::tempdir;

use crosspost_core::config::DirectoryConfig;
use crosspost_core::contract::PublishOutcome;
use crosspost_core::lifecycle::LifecycleManager;
use crosspost_core::media::MediaItem;

fn layout(root: &Path) -> DirectoryConfig {
    let directories = DirectoryConfig {
        input: root.join("input"),
        processed: root.join("processed"),
        quarantine: root.join("quarantine"),
        failed: root.join("failed"),
    };
    fs::create_dir_all(&directories.input).expect("input dir should be creatable");
    directories
}

fn write_item(directories: &DirectoryConfig, name: &str, content: &[u8]) -> MediaItem {
    let path = directories.input.join(name);
    fs::write(&path, content).expect("test media file should be writable");
    MediaItem::from_path(&path)
}

#[test]
fn test_quarantine_moves_media_and_sidecar_and_writes_record() {
    let tmp = tempdir().unwrap();
    let directories = layout(tmp.path());
    fs::write(directories.input.join("hate_rally.txt"), "rally today").unwrap();
    let item = write_item(&directories, "hate_rally.jpg", b"fake image data");

    let manager = LifecycleManager::new(&directories);
    manager
        .quarantine(&item, "BannedKeyword: filename contains banned keyword 'hate'")
        .expect("quarantine should succeed");

    assert!(
        !directories.input.join("hate_rally.jpg").exists(),
        "The media file should leave the input directory"
    );
    assert!(
        directories.quarantine.join("hate_rally.jpg").exists(),
        "The media file should land in quarantine"
    );
    assert!(
        directories.quarantine.join("hate_rally.txt").exists(),
        "The sidecar should travel with the media file"
    );
    assert!(
        directories.quarantine.join("hate_rally_quarantine.log").exists(),
        "A quarantine record should be written next to the file"
    );
}

#[test]
fn test_quarantine_record_contains_reason_timestamp_and_hash() {
    let tmp = tempdir().unwrap();
    let directories = layout(tmp.path());
    let item = write_item(&directories, "clip.xyz", b"not really media");

    let manager = LifecycleManager::new(&directories);
    let reason = "UnsupportedFormat: extension 'xyz' is not an allowed video or image format";
    manager.quarantine(&item, reason).expect("quarantine should succeed");

    let record = fs::read_to_string(directories.quarantine.join("clip_quarantine.log"))
        .expect("record should be readable");
    assert!(
        record.contains("file: clip.xyz"),
        "Record should name the file, got: {record}"
    );
    assert!(
        record.contains(reason),
        "Record should carry the full rejection reason, got: {record}"
    );
    let timestamp = record
        .lines()
        .find_map(|l| l.strip_prefix("quarantined_at: "))
        .expect("record should carry a timestamp line");
    assert!(
        timestamp.contains('T') && timestamp.ends_with('Z'),
        "Timestamp should be ISO-8601 UTC, got: {timestamp}"
    );
    let digest = record
        .lines()
        .find_map(|l| l.strip_prefix("sha256: "))
        .expect("record should carry a content hash line");
    assert_eq!(digest.len(), 64, "SHA-256 hex digest should be 64 chars");
    assert!(
        digest.chars().all(|c| c.is_ascii_hexdigit()),
        "Digest should be hex, got: {digest}"
    );
}

#[test]
fn test_move_to_processed_moves_media_without_record() {
    let tmp = tempdir().unwrap();
    let directories = layout(tmp.path());
    let item = write_item(&directories, "promo.mp4", b"video bytes");

    let manager = LifecycleManager::new(&directories);
    manager
        .move_to_processed(&item)
        .expect("move to processed should succeed");

    assert!(
        directories.processed.join("promo.mp4").exists(),
        "The media file should land in processed"
    );
    assert!(
        !directories.input.join("promo.mp4").exists(),
        "The input directory should no longer hold the file"
    );
    assert!(
        !directories.processed.join("promo_quarantine.log").exists(),
        "Successful items get no quarantine record"
    );
}

#[test]
fn test_move_to_failed_writes_platform_errors() {
    let tmp = tempdir().unwrap();
    let directories = layout(tmp.path());
    let item = write_item(&directories, "promo.mp4", b"video bytes");

    let mut outcomes = BTreeMap::new();
    outcomes.insert(
        "facebook".to_string(),
        PublishOutcome::failed("facebook", "PublisherError: session expired".to_string()),
    );
    outcomes.insert(
        "youtube".to_string(),
        PublishOutcome::failed("youtube", "Timeout: publish did not complete within 300s".to_string()),
    );

    let manager = LifecycleManager::new(&directories);
    manager
        .move_to_failed(&item, &outcomes)
        .expect("move to failed should succeed");

    assert!(
        directories.failed.join("promo.mp4").exists(),
        "The media file should land in failed"
    );
    let record = fs::read_to_string(directories.failed.join("promo_failed.log"))
        .expect("failed record should be readable");
    assert!(
        record.contains("facebook: PublisherError: session expired"),
        "Record should list each platform's error, got: {record}"
    );
    assert!(
        record.contains("youtube: Timeout"),
        "Record should list each platform's error, got: {record}"
    );
}

#[test]
fn test_missing_source_is_an_error() {
    let tmp = tempdir().unwrap();
    let directories = layout(tmp.path());
    let item = MediaItem::from_path(&directories.input.join("ghost.mp4"));

    let manager = LifecycleManager::new(&directories);
    let moved = manager.move_to_processed(&item);
    assert!(moved.is_err(), "Moving a missing file should fail, not no-op");
}

#[test]
fn test_destination_collision_overwrites_stale_file() {
    let tmp = tempdir().unwrap();
    let directories = layout(tmp.path());
    fs::create_dir_all(&directories.processed).unwrap();
    fs::write(directories.processed.join("promo.mp4"), b"stale copy").unwrap();
    let item = write_item(&directories, "promo.mp4", b"fresh copy");

    let manager = LifecycleManager::new(&directories);
    manager
        .move_to_processed(&item)
        .expect("move should overwrite a stale file of the same name");

    let content = fs::read(directories.processed.join("promo.mp4")).unwrap();
    assert_eq!(
        content, b"fresh copy",
        "The fresh file should replace the stale one"
    );
}

#[test]
fn test_sidecar_travels_to_processed() {
    let tmp = tempdir().unwrap();
    let directories = layout(tmp.path());
    fs::write(directories.input.join("promo.txt"), "caption text").unwrap();
    let item = write_item(&directories, "promo.mp4", b"video bytes");

    let manager = LifecycleManager::new(&directories);
    manager
        .move_to_processed(&item)
        .expect("move to processed should succeed");

    assert!(
        directories.processed.join("promo.txt").exists(),
        "The sidecar should travel with the media file"
    );
    assert!(
        !directories.input.join("promo.txt").exists(),
        "The sidecar should leave the input directory"
    );
}
