//! fsprims-fs: Root-filesystem aware file primitives.
//!
//! Every path-taking operation first rewrites its path through a [`RootFs`]
//! and then performs the native call, so the same agent code can watch the
//! host or a mounted container root.
//!
//! ## Operations
//!
//! | Operation | Unix | Windows |
//! |-----------|------|---------|
//! | [`RootFs::stat`] | stat(2) | metadata, handle fallback for size 0 |
//! | [`RootFs::open`] | open(2) | CreateFileW (binary) |
//! | [`close`] | close(2) | CloseHandle |
//! | [`RootFs::read_link`] | readlink(2) | `NotSupported` |
//! | [`RootFs::open_dir`] | opendir(3) | `NotSupported` |
//! | [`RootFs::open_stream`] | buffered file | buffered file |
//!
//! Each operation is available as a method on an explicit [`RootFs`] and as
//! a free function using the process-wide setting from
//! [`set_root_filesystem`].
//!
//! ## Example
//!
//! ```no_run
//! use fsprims_fs::{RootFs, OpenFlags};
//!
//! let rootfs = RootFs::new("/mnt/container");
//! let status = rootfs.stat("/etc/hostname")?;
//! let file = rootfs.open("/etc/hostname", OpenFlags::READ)?;
//! fsprims_fs::close(file)?;
//! # Ok::<(), fsprims_core::FsprimsError>(())
//! ```

use std::ffi::OsString;
use std::fs::{File, Metadata, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bitflags::bitflags;
use fsprims_core::{FsprimsError, FsprimsResult};
use serde::Serialize;

mod rootfs;
mod stream;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as platform;
#[cfg(windows)]
use windows as platform;

pub use rootfs::{root_filesystem, set_root_filesystem, RootFs, MAX_PATH_LEN};
pub use stream::{close_stream, Stream};

// ============================================================================
// Core Types
// ============================================================================

/// Type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    Other,
}

/// Result of [`RootFs::stat`].
#[derive(Debug, Clone, Serialize)]
pub struct FileStatus {
    /// Entry type. `stat` follows symbolic links, so this is never `Symlink`.
    pub kind: FileKind,

    /// Size in bytes.
    pub size: u64,

    /// Whether the entry is read-only for everyone.
    pub readonly: bool,

    /// Permission and type bits (Unix only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,

    /// Last modification time (RFC 3339), when the platform reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl FileStatus {
    fn from_metadata(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        let kind = if file_type.is_file() {
            FileKind::Regular
        } else if file_type.is_dir() {
            FileKind::Directory
        } else if file_type.is_symlink() {
            FileKind::Symlink
        } else {
            FileKind::Other
        };

        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::MetadataExt;
            Some(metadata.mode())
        };
        #[cfg(not(unix))]
        let mode = None;

        Self {
            kind,
            size: metadata.len(),
            readonly: metadata.permissions().readonly(),
            mode,
            modified: metadata.modified().ok().and_then(format_timestamp),
        }
    }

    /// Whether the entry is a regular file.
    pub fn is_regular(&self) -> bool {
        self.kind == FileKind::Regular
    }

    /// Whether the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

fn format_timestamp(at: SystemTime) -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    OffsetDateTime::from(at).format(&Rfc3339).ok()
}

bitflags! {
    /// Portable open flags.
    ///
    /// Files are always opened in binary mode; no layer below the line
    /// reader translates newlines.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u8 {
        const READ = 0b0000_0001;
        const WRITE = 0b0000_0010;
        const APPEND = 0b0000_0100;
        const CREATE = 0b0000_1000;
        const TRUNCATE = 0b0001_0000;
    }
}

impl OpenFlags {
    /// The equivalent `std` open options.
    pub fn to_open_options(self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        opts.read(self.contains(Self::READ))
            .write(self.contains(Self::WRITE))
            .append(self.contains(Self::APPEND))
            .create(self.contains(Self::CREATE))
            .truncate(self.contains(Self::TRUNCATE));
        opts
    }
}

/// One entry of a directory stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name (not a path).
    pub name: OsString,
    /// Entry type, when the filesystem reports it without a stat call.
    pub kind: Option<FileKind>,
}

/// An open directory stream from [`RootFs::open_dir`].
///
/// Yields entries until the end of the stream. Dropping an unclosed stream
/// closes it and discards any error.
pub struct Dir {
    path: PathBuf,
    inner: platform::DirImpl,
}

impl Dir {
    /// Physical path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next entry, or `None` at the end of the stream.
    pub fn next_entry(&mut self) -> Option<DirEntry> {
        self.inner.next_entry()
    }
}

impl Iterator for Dir {
    type Item = DirEntry;

    fn next(&mut self) -> Option<DirEntry> {
        self.next_entry()
    }
}

impl std::fmt::Debug for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dir").field("path", &self.path).finish()
    }
}

// ============================================================================
// Operations on an explicit root
// ============================================================================

impl RootFs {
    /// Status of the entry at `path`, following symbolic links.
    ///
    /// # Errors
    ///
    /// `NotFound`, `PermissionDenied`, or `Io` with the OS error.
    pub fn stat(&self, path: impl AsRef<Path>) -> FsprimsResult<FileStatus> {
        let physical = self.resolve(path);
        let metadata = platform::stat_impl(&physical)
            .map_err(|e| FsprimsError::from_io("stat", &physical, e))?;
        Ok(FileStatus::from_metadata(&metadata))
    }

    /// Whether `path` exists and is a regular file.
    pub fn is_regular_file(&self, path: impl AsRef<Path>) -> bool {
        self.stat(path).is_ok_and(|status| status.is_regular())
    }

    /// Open `path` with the given flags.
    pub fn open(&self, path: impl AsRef<Path>, flags: OpenFlags) -> FsprimsResult<File> {
        let physical = self.resolve(path);
        flags
            .to_open_options()
            .open(&physical)
            .map_err(|e| FsprimsError::from_io("open", &physical, e))
    }

    /// Read the target of the symbolic link at `path`.
    ///
    /// Like readlink(2), the target is silently truncated to `capacity`
    /// bytes. Not supported on Windows.
    pub fn read_link(&self, path: impl AsRef<Path>, capacity: usize) -> FsprimsResult<PathBuf> {
        #[cfg(unix)]
        {
            let physical = self.resolve(path);
            unix::read_link_impl(&physical, capacity)
                .map_err(|e| FsprimsError::from_io("readlink", &physical, e))
        }

        #[cfg(windows)]
        {
            let _ = (path, capacity);
            Err(FsprimsError::not_supported("readlink", fsprims_core::get_platform()))
        }
    }

    /// Open a directory stream. Not supported on Windows.
    pub fn open_dir(&self, path: impl AsRef<Path>) -> FsprimsResult<Dir> {
        #[cfg(unix)]
        {
            let physical = self.resolve(path);
            let inner = unix::DirImpl::open(&physical)
                .map_err(|e| FsprimsError::from_io("opendir", &physical, e))?;
            Ok(Dir {
                path: physical,
                inner,
            })
        }

        #[cfg(windows)]
        {
            let _ = path;
            Err(FsprimsError::not_supported("opendir", fsprims_core::get_platform()))
        }
    }

    /// Open a buffered stream with an `fopen`-style mode (`r`, `w+`, `ab`, ...).
    pub fn open_stream(&self, path: impl AsRef<Path>, mode: &str) -> FsprimsResult<Stream> {
        Stream::open(self.resolve(path), mode)
    }
}

/// Close a file, surfacing the OS error that dropping would discard.
pub fn close(file: File) -> FsprimsResult<()> {
    platform::close_impl(file).map_err(|e| FsprimsError::io("close", "", e))
}

/// Close a directory stream.
pub fn close_dir(mut dir: Dir) -> FsprimsResult<()> {
    dir.inner
        .close()
        .map_err(|e| FsprimsError::io("closedir", &dir.path, e))
}

// ============================================================================
// Operations on the process-wide root
// ============================================================================

/// [`RootFs::stat`] on the process-wide root.
pub fn stat(path: impl AsRef<Path>) -> FsprimsResult<FileStatus> {
    root_filesystem().stat(path)
}

/// [`RootFs::is_regular_file`] on the process-wide root.
pub fn is_regular_file(path: impl AsRef<Path>) -> bool {
    root_filesystem().is_regular_file(path)
}

/// [`RootFs::open`] on the process-wide root.
pub fn open(path: impl AsRef<Path>, flags: OpenFlags) -> FsprimsResult<File> {
    root_filesystem().open(path, flags)
}

/// [`RootFs::read_link`] on the process-wide root.
pub fn read_link(path: impl AsRef<Path>, capacity: usize) -> FsprimsResult<PathBuf> {
    root_filesystem().read_link(path, capacity)
}

/// [`RootFs::open_dir`] on the process-wide root.
pub fn open_dir(path: impl AsRef<Path>) -> FsprimsResult<Dir> {
    root_filesystem().open_dir(path)
}

/// [`RootFs::open_stream`] on the process-wide root.
pub fn open_stream(path: impl AsRef<Path>, mode: &str) -> FsprimsResult<Stream> {
    root_filesystem().open_stream(path, mode)
}
