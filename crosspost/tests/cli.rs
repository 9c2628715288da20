use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

const OVERRIDE_VARS: &[&str] = &[
    "CROSSPOST_BANNED_KEYWORDS",
    "CROSSPOST_ALLOWED_VIDEO_FORMATS",
    "CROSSPOST_ALLOWED_IMAGE_FORMATS",
    "CROSSPOST_MAX_FILE_SIZE_MB",
    "FACEBOOK_PAGE_ID",
    "FACEBOOK_ACCESS_TOKEN",
    "YOUTUBE_ACCESS_TOKEN",
    "INSTAGRAM_USER_ID",
    "INSTAGRAM_ACCESS_TOKEN",
    "INSTAGRAM_MEDIA_BASE_URL",
    "TIKTOK_ACCESS_TOKEN",
];

fn crosspost_cmd() -> Command {
    let mut cmd = Command::cargo_bin("crosspost").expect("Binary exists");
    // The binary reads overrides from the environment; keep the test hermetic.
    for var in OVERRIDE_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Writes a config whose directories all live under `root`. The facebook
/// section keeps a publisher registered so the pipeline has a target; its
/// dummy credentials are never exercised unless an item passes the gate.
fn write_config(root: &Path, with_platform: bool) -> PathBuf {
    let platforms = if with_platform {
        "platforms:\n  facebook:\n    page_id: \"1\"\n    access_token: \"dummy\"\n"
    } else {
        ""
    };
    let yaml = format!(
        "directories:\n  input: \"{}\"\n  processed: \"{}\"\n  quarantine: \"{}\"\n  failed: \"{}\"\n{platforms}",
        root.join("input").display(),
        root.join("processed").display(),
        root.join("quarantine").display(),
        root.join("failed").display(),
    );
    let path = root.join("crosspost.yaml");
    fs::write(&path, yaml).expect("Writing temp config failed");
    path
}

fn setup(with_platform: bool) -> (TempDir, PathBuf) {
    let tmp = tempdir().expect("Creating temp dir failed");
    fs::create_dir_all(tmp.path().join("input")).expect("Creating input dir failed");
    let config = write_config(tmp.path(), with_platform);
    (tmp, config)
}

#[test]
fn run_with_empty_input_dir_succeeds() {
    let (_tmp, config) = setup(true);

    crosspost_cmd()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 total"));
}

#[test]
fn bare_invocation_defaults_to_run() {
    let (_tmp, config) = setup(true);

    crosspost_cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("complete"));
}

#[test]
fn run_quarantines_banned_file_and_exits_nonzero() {
    let (tmp, config) = setup(true);
    fs::write(tmp.path().join("input").join("hate_rally.jpg"), b"fake image")
        .expect("Writing test media failed");

    crosspost_cmd()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("FAIL")
                .and(predicate::str::contains("hate_rally.jpg"))
                .and(predicate::str::contains("1 quarantined")),
        );

    assert!(
        tmp.path().join("quarantine").join("hate_rally.jpg").exists(),
        "The rejected file should land in quarantine"
    );
    let record = fs::read_to_string(
        tmp.path()
            .join("quarantine")
            .join("hate_rally_quarantine.log"),
    )
    .expect("quarantine record should exist");
    assert!(
        record.contains("BannedKeyword"),
        "The record should carry the violation class, got: {record}"
    );
    assert!(
        !tmp.path().join("input").join("hate_rally.jpg").exists(),
        "The input directory should be drained"
    );
}

#[test]
fn run_with_missing_input_dir_fails() {
    let tmp = tempdir().expect("Creating temp dir failed");
    // Config written without creating the input directory.
    let config = write_config(tmp.path(), true);

    crosspost_cmd()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("input directory"));
}

#[test]
fn check_with_no_platforms_reports_and_succeeds() {
    let (_tmp, config) = setup(false);

    crosspost_cmd()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("No platforms configured"));
}
