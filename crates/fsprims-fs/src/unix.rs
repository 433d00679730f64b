//! Unix implementation of the file primitives.
//!
//! Implementation follows POSIX:
//! - close(2): https://pubs.opengroup.org/onlinepubs/9699919799/functions/close.html
//! - readlink(2): https://pubs.opengroup.org/onlinepubs/9699919799/functions/readlink.html
//! - opendir(3)/readdir(3)/closedir(3)

use std::ffi::{CStr, CString, OsStr, OsString};
use std::fs::{self, File, Metadata};
use std::io;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::os::unix::io::IntoRawFd;
use std::path::{Path, PathBuf};
use std::ptr;

use crate::{DirEntry, FileKind};

// ============================================================================
// stat / close
// ============================================================================

pub fn stat_impl(path: &Path) -> io::Result<Metadata> {
    fs::metadata(path)
}

pub fn close_impl(file: File) -> io::Result<()> {
    let fd = file.into_raw_fd();

    // SAFETY: fd was just released by `into_raw_fd`, nothing else owns it.
    if unsafe { libc::close(fd) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

// ============================================================================
// readlink
// ============================================================================

fn c_path(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "path contains an interior NUL byte",
        )
    })
}

pub fn read_link_impl(path: &Path, capacity: usize) -> io::Result<PathBuf> {
    let c_path = c_path(path)?;
    let mut buf = vec![0u8; capacity];

    // SAFETY: buf is valid for `buf.len()` bytes; readlink never NUL-terminates
    // and never writes past bufsiz.
    let len = unsafe {
        libc::readlink(
            c_path.as_ptr(),
            buf.as_mut_ptr().cast::<libc::c_char>(),
            buf.len(),
        )
    };
    if len == -1 {
        return Err(io::Error::last_os_error());
    }

    buf.truncate(len as usize);
    Ok(PathBuf::from(OsString::from_vec(buf)))
}

// ============================================================================
// Directory streams
// ============================================================================

pub struct DirImpl {
    dirp: *mut libc::DIR,
}

impl DirImpl {
    pub fn open(path: &Path) -> io::Result<Self> {
        let c_path = c_path(path)?;

        // SAFETY: c_path is a valid NUL-terminated string.
        let dirp = unsafe { libc::opendir(c_path.as_ptr()) };
        if dirp.is_null() {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { dirp })
    }

    /// Next entry, or `None` at the end of the directory stream.
    ///
    /// `.` and `..` are returned like any other entry.
    pub fn next_entry(&mut self) -> Option<DirEntry> {
        if self.dirp.is_null() {
            return None;
        }

        // SAFETY: dirp is an open stream owned by self; the returned dirent
        // is only valid until the next readdir call, so we copy out of it.
        unsafe {
            let ent = libc::readdir(self.dirp);
            if ent.is_null() {
                return None;
            }
            let name = CStr::from_ptr((*ent).d_name.as_ptr());
            Some(DirEntry {
                name: OsStr::from_bytes(name.to_bytes()).to_os_string(),
                kind: entry_kind(&*ent),
            })
        }
    }

    pub fn close(&mut self) -> io::Result<()> {
        if self.dirp.is_null() {
            return Ok(());
        }

        let dirp = std::mem::replace(&mut self.dirp, ptr::null_mut());
        // SAFETY: dirp came from opendir and is closed exactly once.
        if unsafe { libc::closedir(dirp) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl Drop for DirImpl {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd"
))]
fn entry_kind(ent: &libc::dirent) -> Option<FileKind> {
    match ent.d_type {
        libc::DT_REG => Some(FileKind::Regular),
        libc::DT_DIR => Some(FileKind::Directory),
        libc::DT_LNK => Some(FileKind::Symlink),
        libc::DT_UNKNOWN => None,
        _ => Some(FileKind::Other),
    }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd"
)))]
fn entry_kind(_ent: &libc::dirent) -> Option<FileKind> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_impl_surfaces_success() {
        let file = File::open("/dev/null").expect("open /dev/null");
        assert!(close_impl(file).is_ok());
    }

    #[test]
    fn read_link_impl_missing_path_is_not_found() {
        let err = read_link_impl(Path::new("/nonexistent/fsprims/link"), 64).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn read_link_impl_rejects_interior_nul() {
        let path = PathBuf::from(OsString::from_vec(b"/tmp/a\0b".to_vec()));
        let err = read_link_impl(&path, 64).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn dir_impl_reports_dot_entries() {
        let mut dir = DirImpl::open(Path::new("/")).expect("opendir /");
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry() {
            names.push(entry.name);
        }
        assert!(names.iter().any(|n| n == "."));
        assert!(names.iter().any(|n| n == ".."));
        assert!(dir.close().is_ok());
        // Closing twice is harmless and reading after close ends the stream.
        assert!(dir.close().is_ok());
        assert!(dir.next_entry().is_none());
    }
}
