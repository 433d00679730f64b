//! Unix locking for PID files.
//!
//! Locks come from `fs2::FileExt`, which uses flock(2). flock locks belong
//! to the open file description, so two opens of the same file conflict
//! even inside one process.
//!
//! Close-on-exec follows fcntl(2) F_SETFD / FD_CLOEXEC.

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;

use fs2::FileExt;

pub fn try_lock_impl(file: &File) -> io::Result<()> {
    FileExt::try_lock_exclusive(file)
}

pub fn unlock_impl(file: &File) -> io::Result<()> {
    FileExt::unlock(file)
}

pub fn set_cloexec_impl(file: &File) -> io::Result<()> {
    let fd = file.as_raw_fd();

    // SAFETY: F_GETFD/F_SETFD only touch descriptor flags of an open fd.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFD);
        if flags == -1 {
            return Err(io::Error::last_os_error());
        }
        if libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}
