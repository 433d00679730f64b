use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn pid_path(tag: &str) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "fsprims-cli-{tag}-{}-{now}.pid",
        std::process::id()
    ))
}

/// Start `fsprims pid hold` in the background and wait until it owns the file.
fn spawn_holder(path: &Path, seconds: u64) -> Child {
    let child = Command::new(env!("CARGO_BIN_EXE_fsprims"))
        .args(["--log-level", "warn", "pid", "hold"])
        .arg(path)
        .args(["--seconds", &seconds.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn holder");

    let expected = child.id().to_string();
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if fs::read_to_string(path).is_ok_and(|s| s == expected) {
            return child;
        }
        thread::sleep(Duration::from_millis(20));
    }
    panic!("holder never wrote its PID to {}", path.display());
}

#[test]
fn pid_hold_writes_and_removes_file() {
    let path = pid_path("hold");

    let mut cmd = cargo_bin_cmd!("fsprims");
    cmd.args(["pid", "hold"]).arg(&path);

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        v["schema_id"],
        "https://schemas.3leaps.dev/fsprims/pidfile/v1.0.0/pid-file-status.schema.json"
    );
    assert_eq!(v["held"], true);
    assert!(v["pid"].as_u64().unwrap() > 0);

    assert!(!path.exists());
}

#[test]
fn second_instance_fails_while_first_holds() {
    let path = pid_path("contend");
    let mut holder = spawn_holder(&path, 30);

    let mut cmd = cargo_bin_cmd!("fsprims");
    cmd.args(["pid", "hold"]).arg(&path);
    cmd.assert()
        .code(10)
        .stderr(predicate::str::contains("already running"));

    let mut cmd = cargo_bin_cmd!("fsprims");
    cmd.args(["pid", "read"]).arg(&path);
    cmd.assert()
        .success()
        .stdout(format!("{}\n", holder.id()));

    // A killed holder leaves an unlocked file behind, which is reclaimed.
    holder.kill().unwrap();
    holder.wait().unwrap();
    assert!(path.exists());

    let mut cmd = cargo_bin_cmd!("fsprims");
    cmd.args(["pid", "hold"]).arg(&path);
    cmd.assert().success();
    assert!(!path.exists());
}

#[test]
fn pid_read_errors_map_to_exit_codes() {
    let missing = pid_path("missing");
    let mut cmd = cargo_bin_cmd!("fsprims");
    cmd.args(["pid", "read"]).arg(&missing);
    cmd.assert()
        .code(11)
        .stderr(predicate::str::contains("cannot open PID file"));

    let garbage = pid_path("garbage");
    fs::write(&garbage, b"nope").unwrap();
    let mut cmd = cargo_bin_cmd!("fsprims");
    cmd.args(["pid", "read"]).arg(&garbage);
    cmd.assert()
        .code(13)
        .stderr(predicate::str::contains("cannot retrieve PID from file"));

    let _ = fs::remove_file(&garbage);
}
