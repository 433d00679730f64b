use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;

#[test]
fn test_log_format_text() {
    let mut cmd = cargo_bin_cmd!("fsprims");
    cmd.env_remove("FSPRIMS_ROOT_FS")
        .arg("--log-format")
        .arg("text")
        .arg("--log-level")
        .arg("info")
        .args(["resolve", "/a/b"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"physical\""))
        .stderr(predicate::str::contains("INFO"))
        .stderr(predicate::str::contains("Running command"))
        .stderr(predicate::str::contains("Command finished"));
}

#[test]
fn test_log_format_json() {
    let mut cmd = cargo_bin_cmd!("fsprims");
    cmd.env_remove("FSPRIMS_ROOT_FS")
        .env_remove("RUST_LOG")
        .arg("--log-format")
        .arg("json")
        .arg("--log-level")
        .arg("info")
        .args(["resolve", "/a/b"]);

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    let log_lines: Vec<Value> = stderr
        .lines()
        .map(|line| serde_json::from_str(line).expect("stderr line should be valid JSON"))
        .collect();

    assert_eq!(log_lines.len(), 2);

    assert_eq!(log_lines[0]["level"].as_str().unwrap(), "INFO");
    assert_eq!(
        log_lines[0]["fields"]["message"].as_str().unwrap(),
        "Running command"
    );
    assert_eq!(log_lines[0]["fields"]["command"].as_str().unwrap(), "resolve");

    assert_eq!(log_lines[1]["level"].as_str().unwrap(), "INFO");
    assert_eq!(
        log_lines[1]["fields"]["message"].as_str().unwrap(),
        "Command finished"
    );
    assert_eq!(log_lines[1]["fields"]["exit_code"].as_i64().unwrap(), 0);
}

#[test]
fn test_log_level_debug_shows_path_conversion() {
    let mut cmd = cargo_bin_cmd!("fsprims");
    cmd.args(["--log-level", "debug", "--root-fs", "/mnt/host", "resolve", "/etc/hostname"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("DEBUG"))
        .stderr(predicate::str::contains("Rootfs path conversion"));
}

#[test]
fn test_log_level_warn_is_quiet() {
    let mut cmd = cargo_bin_cmd!("fsprims");
    cmd.env_remove("FSPRIMS_ROOT_FS")
        .env_remove("RUST_LOG")
        .args(["--log-level", "warn", "resolve", "/a/b"]);

    cmd.assert().success().stderr(predicate::str::is_empty());
}

#[test]
fn test_no_subcommand_prints_help() {
    let mut cmd = cargo_bin_cmd!("fsprims");
    cmd.env_remove("RUST_LOG");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Usage: fsprims"))
        .stdout(predicate::str::contains("resolve"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_log_level_debug_reports_os_error_on_failure() {
    let mut cmd = cargo_bin_cmd!("fsprims");
    cmd.env_remove("FSPRIMS_ROOT_FS")
        .env_remove("RUST_LOG")
        .args(["--log-format", "json", "--log-level", "debug"])
        .args(["stat", "/definitely/not/here/fsprims"]);

    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(5));

    let stderr = String::from_utf8(output.stderr).unwrap();
    let failed = stderr
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find(|v| v["fields"]["message"] == "Command failed")
        .expect("failure should be logged at debug level");

    assert_eq!(failed["level"].as_str().unwrap(), "DEBUG");
    assert_eq!(failed["fields"]["code"].as_i64().unwrap(), 5);
    assert!(failed["fields"]["os_error"].as_str().unwrap().starts_with("Some("));
}
