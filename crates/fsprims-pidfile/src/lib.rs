//! fsprims-pidfile: Single-instance enforcement through locked PID files.
//!
//! A [`PidFile`] holds an exclusive advisory lock on a file containing the
//! current process id. A second process (or a second `PidFile` in the same
//! process) trying to create the same file gets
//! [`FsprimsError::AlreadyRunning`]. A file left behind by a crashed
//! instance carries no lock and is silently reclaimed.
//!
//! ## Lifecycle
//!
//! ```no_run
//! use fsprims_pidfile::{read_pid, PidFile};
//!
//! let mut pid_file = PidFile::create("/run/agent.pid")?;
//! assert_eq!(read_pid("/run/agent.pid")?, std::process::id());
//!
//! // ... run ...
//!
//! pid_file.remove();
//! # Ok::<(), fsprims_core::FsprimsError>(())
//! ```
//!
//! Dropping the handle removes the file as well.
//!
//! ## Platform notes
//!
//! - Unix: `flock(2)` through `fs2`; the descriptor is marked close-on-exec
//!   so children do not inherit the lock.
//! - Windows: `LockFileEx` on one byte at a high offset, which leaves the
//!   PID text readable.
//!
//! PID files always live in the host namespace; the root-filesystem
//! redirection of `fsprims-fs` does not apply to them.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use fsprims_core::{FsprimsError, FsprimsResult};
use fsprims_fs::{close, OpenFlags, RootFs};
use tracing::{debug, warn};

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as platform;
#[cfg(windows)]
use windows as platform;

/// A locked PID file owned by the running process.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    file: Option<File>,
    pid: u32,
}

impl PidFile {
    /// Create `path`, lock it and write the current process id.
    ///
    /// # Errors
    ///
    /// - `AlreadyRunning` if an existing file is locked by a live instance
    /// - `PidFileOpen` if an existing file cannot be opened to test its lock
    /// - `PidFileCreate` if the file cannot be created
    /// - `Io` if writing the PID fails; the file is removed again
    pub fn create(path: impl AsRef<Path>) -> FsprimsResult<Self> {
        let path = path.as_ref();

        check_existing(path)?;

        let file = (OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE)
            .to_open_options()
            .open(path)
            .map_err(|e| FsprimsError::pid_file_create(path, e))?;

        if let Err(e) = platform::try_lock_impl(&file) {
            warn!(path = %path.display(), error = %e, "Could not lock PID file");
        }
        if let Err(e) = platform::set_cloexec_impl(&file) {
            warn!(path = %path.display(), error = %e, "Could not mark PID file close-on-exec");
        }

        let mut pid_file = PidFile {
            path: path.to_path_buf(),
            file: Some(file),
            pid: std::process::id(),
        };
        pid_file.write_pid()?;

        debug!(path = %path.display(), pid = pid_file.pid, "PID file created");
        Ok(pid_file)
    }

    fn write_pid(&mut self) -> FsprimsResult<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        write!(file, "{}", self.pid)
            .and_then(|()| file.flush())
            .map_err(|e| FsprimsError::io("write", &self.path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The process id written to the file.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Whether the file is still held, i.e. [`remove`](Self::remove) has not run.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Unlock, close and delete the file.
    ///
    /// Only the first call does anything. Failures are logged, not returned,
    /// since there is nothing left for the caller to do about them.
    pub fn remove(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };

        let _ = platform::unlock_impl(&file);
        if let Err(e) = close(file) {
            warn!(path = %self.path.display(), error = %e, "Closing PID file failed");
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "PID file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Deleting PID file failed"),
        }
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Fail if `path` is a PID file locked by someone else.
///
/// An unlocked regular file is stale and left for the caller to overwrite.
/// Anything that is not a regular file is ignored here; creating over it
/// reports the real problem.
fn check_existing(path: &Path) -> FsprimsResult<()> {
    if !RootFs::none().is_regular_file(path) {
        return Ok(());
    }

    let existing = OpenFlags::APPEND
        .to_open_options()
        .open(path)
        .map_err(|e| FsprimsError::pid_file_open(path, e))?;

    platform::try_lock_impl(&existing).map_err(|e| FsprimsError::already_running(path, e))?;

    debug!(path = %path.display(), "Reclaiming stale PID file");
    let _ = platform::unlock_impl(&existing);
    if let Err(e) = close(existing) {
        debug!(path = %path.display(), error = %e, "Closing stale PID file failed");
    }
    Ok(())
}

/// Read the process id stored in `path`.
///
/// Leading whitespace and a `+` sign are accepted, and anything after the
/// digits is ignored. Unlike a plain `%d` scan, zero and negative values are
/// rejected since they never name a process.
///
/// # Errors
///
/// - `PidFileOpen` if the file cannot be opened
/// - `Io` if reading it fails
/// - `PidFileParse` if it does not start with a positive integer that fits a PID
pub fn read_pid(path: impl AsRef<Path>) -> FsprimsResult<u32> {
    let path = path.as_ref();

    let mut file = OpenFlags::READ
        .to_open_options()
        .open(path)
        .map_err(|e| FsprimsError::pid_file_open(path, e))?;

    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .map_err(|e| FsprimsError::io("read", path, e))?;

    parse_pid(&content).ok_or_else(|| FsprimsError::pid_file_parse(path))
}

fn parse_pid(content: &[u8]) -> Option<u32> {
    let text = content.trim_ascii_start();
    let (negative, digits) = match text.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, text),
    };

    let len = digits.iter().take_while(|b| b.is_ascii_digit()).count();
    if len == 0 || negative {
        return None;
    }

    let pid = std::str::from_utf8(&digits[..len]).ok()?.parse::<u32>().ok()?;
    (pid > 0).then_some(pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_leading_integer() {
        assert_eq!(parse_pid(b"4242"), Some(4242));
        assert_eq!(parse_pid(b"  \n\t17"), Some(17));
        assert_eq!(parse_pid(b"+8"), Some(8));
        assert_eq!(parse_pid(b"123abc"), Some(123));
        assert_eq!(parse_pid(b"99\n"), Some(99));
    }

    #[test]
    fn rejects_non_pids() {
        assert_eq!(parse_pid(b""), None);
        assert_eq!(parse_pid(b"   "), None);
        assert_eq!(parse_pid(b"abc"), None);
        assert_eq!(parse_pid(b"-5"), None);
        assert_eq!(parse_pid(b"0"), None);
        assert_eq!(parse_pid(b"+ 5"), None);
        assert_eq!(parse_pid(b"99999999999999"), None);
    }
}
