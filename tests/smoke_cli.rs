//! End-to-end runs of the `podsmoke` binary.
//!
//! A shell script stands in for the container runtime and records the
//! commands it receives. The test against a real podman is `#[ignore]`d.
//! Run it with: `cargo test -- --ignored`
#![cfg(unix)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const PASSING_RUNTIME: &str = r#"state="$(dirname "$0")"
cmd="$1"; shift
case "$cmd" in
  run) echo "$@" >> "$state/run.txt"; echo 4f1c2d ;;
  logs) echo starting; echo "Hello world"; exec sleep 30 ;;
  stop) echo "$@" >> "$state/stops.txt" ;;
esac
"#;

const FAILING_RUNTIME: &str = r#"state="$(dirname "$0")"
cmd="$1"; shift
case "$cmd" in
  run) echo "Error: image not known" >&2; exit 125 ;;
  stop) echo "$@" >> "$state/stops.txt"; exit 125 ;;
esac
"#;

const QUIET_RUNTIME: &str = r#"state="$(dirname "$0")"
cmd="$1"; shift
case "$cmd" in
  logs) echo starting; echo "hello in lowercase" ;;
  stop) echo "$@" >> "$state/stops.txt" ;;
esac
"#;

/// Lay out a runtime script and a settings file pointing at it.
fn setup(script: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let runtime = dir.path().join("runtime.sh");
    std::fs::write(&runtime, script).unwrap();

    let settings = dir.path().join("settings.yaml");
    std::fs::write(
        &settings,
        format!(
            "runtime: \"sh '{}'\"\npoll_interval_ms: 100\n",
            runtime.display()
        ),
    )
    .unwrap();
    (dir, settings)
}

fn podsmoke_cmd(dir: &Path, settings: &Path) -> Command {
    let mut cmd = Command::cargo_bin("podsmoke").unwrap();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("PODSMOKE_CONFIG")
        .arg("--config")
        .arg(settings);
    cmd
}

fn stops(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("stops.txt"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn marker_in_output_passes_and_stops_once() {
    let (dir, settings) = setup(PASSING_RUNTIME);
    let base = dir.path().join("bed");
    std::fs::create_dir(&base).unwrap();

    podsmoke_cmd(dir.path(), &settings)
        .args(["--app-name", "registry.example/app:latest", "--duration", "2"])
        .arg("--base")
        .arg(&base)
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello world"));

    assert_eq!(stops(dir.path()), vec!["app_latest-testbed"]);

    let run = std::fs::read_to_string(dir.path().join("run.txt")).unwrap();
    assert!(run.starts_with("-d --rm -p 60001:60001 -p 44821:44821 -v "));
    assert!(run.contains(":/base:Z --name app_latest-testbed registry.example/app:latest"));

    let logs = base.join("logs");
    let sink = std::fs::read_to_string(logs.join("app_latest_output.log")).unwrap();
    assert_eq!(sink, "starting\nHello world\n");

    let validation = std::fs::read_to_string(logs.join("validation.log")).unwrap();
    assert!(validation.ends_with("Test completed successfully.\n"));
    assert!(logs.join("testing.log").exists());

    let masters = std::fs::read_dir(&logs)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("master_"))
        .count();
    assert_eq!(masters, 1);
}

#[test]
fn launch_failure_exits_one_without_sink() {
    let (dir, settings) = setup(FAILING_RUNTIME);

    podsmoke_cmd(dir.path(), &settings)
        .args(["--app-name", "registry.example/app:latest", "--duration", "2"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("image not known"));

    assert!(!dir.path().join("logs/app_latest_output.log").exists());
    assert_eq!(stops(dir.path()), vec!["app_latest-testbed"]);
}

#[test]
fn missing_marker_exits_one() {
    let (dir, settings) = setup(QUIET_RUNTIME);

    podsmoke_cmd(dir.path(), &settings)
        .args(["--app-name", "app:1", "--duration", "5", "--log-file", "capture.log"])
        .assert()
        .code(1);

    let sink = std::fs::read_to_string(dir.path().join("logs/capture.log")).unwrap();
    assert_eq!(sink, "starting\nhello in lowercase\n");
    assert_eq!(stops(dir.path()), vec!["app_1-testbed"]);
}

#[test]
fn app_name_is_required() {
    Command::cargo_bin("podsmoke")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--app-name"));
}

#[test]
fn invalid_settings_fail_before_touching_the_runtime() {
    let (dir, _) = setup(PASSING_RUNTIME);
    let settings = dir.path().join("bad.yaml");
    std::fs::write(&settings, "success_pattern: \"Hello(\"\n").unwrap();

    podsmoke_cmd(dir.path(), &settings)
        .args(["--app-name", "app"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("success_pattern"));

    assert!(!dir.path().join("run.txt").exists());
    assert!(!dir.path().join("logs").exists());
}

#[test]
#[ignore]
fn real_podman_logcollector_image() {
    let dir = tempfile::tempdir().unwrap();
    let settings = dir.path().join("settings.yaml");
    std::fs::write(&settings, "runtime: podman\n").unwrap();

    podsmoke_cmd(dir.path(), &settings)
        .args([
            "--app-name",
            "quay.io/nikesh_sar/logcollector:latest",
            "--duration",
            "10",
        ])
        .assert()
        .success();
}
