//! CLI command integration tests.
//! Each test uses a temp directory via MM_DATA_DIR for full isolation.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mm_cmd(data_dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("mm").unwrap();
    cmd.env("MM_DATA_DIR", data_dir.path());
    cmd
}

/// Four streams with a co-occurrence cluster around t = 10–12s.
const CLUSTERED_STREAMS: &str = r#"{
    "visual":     [{"timestamp": 10.0, "magnitude": 0.9, "label": "scene_cut"}],
    "speech":     [{"timestamp": 11.0, "magnitude": 0.8, "label": "positive"}],
    "comment":    [{"timestamp": 12.0, "magnitude": 0.7, "label": "positive"}],
    "engagement": [{"timestamp": 10.0, "magnitude": 0.95, "label": "spike"}]
}"#;

fn write_streams(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("streams.json");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn correlate_prints_moments() {
    let dir = TempDir::new().unwrap();
    let streams = write_streams(&dir, CLUSTERED_STREAMS);

    mm_cmd(&dir)
        .arg("correlate")
        .arg(&streams)
        .assert()
        .success()
        .stdout(predicate::str::contains("#1"))
        .stdout(predicate::str::contains("visual+speech+comment+engagement"))
        .stdout(predicate::str::contains("1 moment(s)"))
        .stdout(predicate::str::contains("0 record(s) skipped"));
}

#[test]
fn correlate_surfaces_dominant_labels() {
    let dir = TempDir::new().unwrap();
    let streams = write_streams(&dir, CLUSTERED_STREAMS);

    mm_cmd(&dir)
        .arg("correlate")
        .arg(&streams)
        .assert()
        .success()
        .stdout(predicate::str::contains("positive"));
}

#[test]
fn correlate_counts_skipped_records() {
    let dir = TempDir::new().unwrap();
    let streams = write_streams(
        &dir,
        r#"{
            "visual": [
                {"timestamp": -5.0, "magnitude": 0.5},
                {"timestamp": 10.0, "magnitude": 0.9}
            ],
            "speech": [{"timestamp": 11.0, "magnitude": 0.8}]
        }"#,
    );

    mm_cmd(&dir)
        .arg("correlate")
        .arg(&streams)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 record(s) skipped"));
}

#[test]
fn correlate_empty_streams_is_valid() {
    let dir = TempDir::new().unwrap();
    let streams = write_streams(&dir, "{}");

    mm_cmd(&dir)
        .arg("correlate")
        .arg(&streams)
        .assert()
        .success()
        .stdout(predicate::str::contains("(no moments found)"));
}

#[test]
fn correlate_rejects_bad_config() {
    let dir = TempDir::new().unwrap();
    let streams = write_streams(&dir, CLUSTERED_STREAMS);

    mm_cmd(&dir)
        .args(["correlate", "--window", "10", "--slide", "20"])
        .arg(&streams)
        .assert()
        .failure()
        .stderr(predicate::str::contains("slide step"));
}

#[test]
fn correlate_rejects_unknown_decay() {
    let dir = TempDir::new().unwrap();
    let streams = write_streams(&dir, CLUSTERED_STREAMS);

    mm_cmd(&dir)
        .args(["correlate", "--decay", "cosine"])
        .arg(&streams)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown decay"));
}

#[test]
fn correlate_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    mm_cmd(&dir)
        .args(["correlate", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn config_file_with_flag_override() {
    let dir = TempDir::new().unwrap();
    let streams = write_streams(&dir, CLUSTERED_STREAMS);

    let config_path = dir.path().join("mm.toml");
    std::fs::write(
        &config_path,
        "window_secs = 4.0\nslide_secs = 8.0\n", // invalid on its own
    )
    .unwrap();

    // Flag override repairs the file's bad geometry
    mm_cmd(&dir)
        .arg("correlate")
        .arg(&streams)
        .arg("--config")
        .arg(&config_path)
        .args(["--window", "16"])
        .assert()
        .success();

    // Without the override the file is rejected
    mm_cmd(&dir)
        .arg("correlate")
        .arg(&streams)
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure();
}

#[test]
fn save_then_report_round_trip() {
    let dir = TempDir::new().unwrap();
    let streams = write_streams(&dir, CLUSTERED_STREAMS);

    mm_cmd(&dir)
        .arg("correlate")
        .arg(&streams)
        .args(["--video-id", "dQw4w9WgXcQ", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("saved run"));

    mm_cmd(&dir)
        .args(["report", "--video-id", "dQw4w9WgXcQ"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dQw4w9WgXcQ"))
        .stdout(predicate::str::contains("#1"));
}

#[test]
fn report_without_runs() {
    let dir = TempDir::new().unwrap();
    mm_cmd(&dir)
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::contains("(no stored runs)"));
}

#[test]
fn runs_lists_saved_runs() {
    let dir = TempDir::new().unwrap();
    let streams = write_streams(&dir, CLUSTERED_STREAMS);

    mm_cmd(&dir)
        .arg("correlate")
        .arg(&streams)
        .args(["--video-id", "vid-a", "--save"])
        .assert()
        .success();

    mm_cmd(&dir)
        .arg("runs")
        .assert()
        .success()
        .stdout(predicate::str::contains("video=vid-a"))
        .stdout(predicate::str::contains("moments=1"));
}

#[test]
fn export_writes_moment_json() {
    let dir = TempDir::new().unwrap();
    let streams = write_streams(&dir, CLUSTERED_STREAMS);

    mm_cmd(&dir)
        .arg("correlate")
        .arg(&streams)
        .args(["--video-id", "vid-x", "--save"])
        .assert()
        .success();

    let out = dir.path().join("moments.json");
    mm_cmd(&dir)
        .arg("export")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported 1 moment(s)"));

    let exported = std::fs::read_to_string(&out).unwrap();
    let moments: Vec<serde_json::Value> = serde_json::from_str(&exported).unwrap();
    assert_eq!(moments.len(), 1);
    assert!(moments[0]["score"].as_f64().unwrap() > 0.0);
}

#[test]
fn generous_timeout_still_succeeds() {
    let dir = TempDir::new().unwrap();
    let streams = write_streams(&dir, CLUSTERED_STREAMS);

    mm_cmd(&dir)
        .arg("correlate")
        .arg(&streams)
        .args(["--timeout-secs", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 moment(s)"));
}
