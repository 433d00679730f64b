use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use fsprims_core::FsprimsError;
use fsprims_pidfile::{read_pid, PidFile};

fn pid_path(tag: &str) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("fsprims-pidfile-{tag}-{}-{now}.pid", std::process::id()))
}

#[test]
fn create_writes_current_pid_without_newline() {
    let path = pid_path("create");

    let pid_file = PidFile::create(&path).expect("create");
    assert!(pid_file.is_held());
    assert_eq!(pid_file.path(), path.as_path());

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, std::process::id().to_string());
    assert_eq!(read_pid(&path).unwrap(), std::process::id());
}

#[test]
fn second_instance_is_rejected_until_removed() {
    let path = pid_path("contend");

    let mut first = PidFile::create(&path).expect("first");

    let err = PidFile::create(&path).unwrap_err();
    assert!(matches!(err, FsprimsError::AlreadyRunning { .. }), "{err:?}");
    assert_eq!(err.error_code(), 10);
    let message = err.to_string();
    assert!(message.starts_with("Is this process already running? Could not lock PID file ["));
    assert!(message.contains(&path.display().to_string()));

    // The losing attempt must not have clobbered the winner's file.
    assert_eq!(read_pid(&path).unwrap(), std::process::id());

    first.remove();
    assert!(!path.exists());

    let second = PidFile::create(&path).expect("create after remove");
    drop(second);
    assert!(!path.exists());
}

#[test]
fn stale_file_is_reclaimed() {
    let path = pid_path("stale");
    fs::write(&path, b"999999\nleftover").unwrap();

    let pid_file = PidFile::create(&path).expect("reclaim stale file");
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        std::process::id().to_string()
    );
    drop(pid_file);
}

#[test]
fn remove_is_idempotent() {
    let path = pid_path("remove");
    let mut pid_file = PidFile::create(&path).unwrap();

    pid_file.remove();
    assert!(!pid_file.is_held());
    pid_file.remove();

    // A file recreated by someone else is not ours to delete.
    fs::write(&path, b"1").unwrap();
    pid_file.remove();
    drop(pid_file);
    assert!(path.exists());

    let _ = fs::remove_file(&path);
}

#[test]
fn read_pid_distinguishes_open_and_parse_failures() {
    let missing = pid_path("missing");
    let err = read_pid(&missing).unwrap_err();
    assert!(matches!(err, FsprimsError::PidFileOpen { .. }), "{err:?}");
    assert!(err.to_string().starts_with("cannot open PID file ["));

    let garbage = pid_path("garbage");
    fs::write(&garbage, b"not a pid").unwrap();
    let err = read_pid(&garbage).unwrap_err();
    assert!(matches!(err, FsprimsError::PidFileParse { .. }), "{err:?}");
    assert_eq!(
        err.to_string(),
        format!("cannot retrieve PID from file [{}]", garbage.display())
    );

    fs::write(&garbage, b"  4321 trailing").unwrap();
    assert_eq!(read_pid(&garbage).unwrap(), 4321);

    // Integers that cannot name a process are malformed content.
    for content in [&b"0"[..], b"-42"] {
        fs::write(&garbage, content).unwrap();
        let err = read_pid(&garbage).unwrap_err();
        assert!(matches!(err, FsprimsError::PidFileParse { .. }), "{err:?}");
    }

    let _ = fs::remove_file(&garbage);
}

#[test]
fn create_in_missing_directory_fails_to_create() {
    let path = pid_path("nodir").join("agent.pid");

    let err = PidFile::create(&path).unwrap_err();
    assert!(matches!(err, FsprimsError::PidFileCreate { .. }), "{err:?}");
    assert!(err.to_string().starts_with("cannot create PID file ["));
}

#[test]
fn directory_in_place_of_file_fails_to_create() {
    let path = pid_path("isdir");
    fs::create_dir(&path).unwrap();

    let err = PidFile::create(&path).unwrap_err();
    assert!(matches!(err, FsprimsError::PidFileCreate { .. }), "{err:?}");

    let _ = fs::remove_dir(&path);
}
