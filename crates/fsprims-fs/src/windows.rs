//! Windows implementation of the file primitives.
//!
//! Symbolic link targets and directory streams are POSIX-only capabilities;
//! the crate root reports them as `NotSupported` before reaching this module.

use std::fs::{self, File, Metadata};
use std::io;
use std::os::windows::io::IntoRawHandle;
use std::path::Path;

use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};

use crate::DirEntry;

pub fn stat_impl(path: &Path) -> io::Result<Metadata> {
    let metadata = fs::metadata(path)?;
    if metadata.is_dir() || metadata.len() != 0 {
        return Ok(metadata);
    }

    // Directory entries of symlinks and some special files report size 0.
    // The metadata of an open handle carries the real size.
    let file = File::open(path)?;
    file.metadata()
}

pub fn close_impl(file: File) -> io::Result<()> {
    let handle = file.into_raw_handle() as HANDLE;

    // SAFETY: the handle was just released by `into_raw_handle`.
    if unsafe { CloseHandle(handle) } == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Directory streams cannot be opened on Windows, so this type has no values.
pub enum DirImpl {}

impl DirImpl {
    pub fn next_entry(&mut self) -> Option<DirEntry> {
        match *self {}
    }

    pub fn close(&mut self) -> io::Result<()> {
        match *self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_impl_reports_real_size() {
        let path = std::env::temp_dir().join(format!("fsprims-win-stat-{}", std::process::id()));
        fs::write(&path, b"12345").expect("write temp file");
        let metadata = stat_impl(&path).expect("stat");
        assert_eq!(metadata.len(), 5);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn close_impl_surfaces_success() {
        let path = std::env::temp_dir().join(format!("fsprims-win-close-{}", std::process::id()));
        let file = File::create(&path).expect("create temp file");
        assert!(close_impl(file).is_ok());
        let _ = fs::remove_file(&path);
    }
}
