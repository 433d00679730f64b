//! Root filesystem redirection.
//!
//! A [`RootFs`] rewrites logical paths into physical ones by prefixing a
//! configured directory, so that an agent running on the host can inspect a
//! container's filesystem as if it were `/`. The prefix is a plain string
//! concatenation: root `/mnt/host` and path `/proc/stat` give
//! `/mnt/host/proc/stat`.
//!
//! On Windows paths already live in a single global namespace and resolution
//! is the identity function.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use fsprims_core::{FsprimsError, FsprimsResult};
use tracing::debug;

/// Default capacity used by [`RootFs::resolve`], in bytes including the
/// terminator slot of the equivalent C buffer.
pub const MAX_PATH_LEN: usize = 2048;

/// Root filesystem setting.
///
/// An empty root and `/` are both treated as "no redirection".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootFs {
    root: Option<OsString>,
}

impl RootFs {
    /// Create a resolver for the given root directory.
    pub fn new(root: impl Into<OsString>) -> Self {
        let root = root.into();
        if root.is_empty() || root.as_os_str() == "/" {
            Self::none()
        } else {
            Self { root: Some(root) }
        }
    }

    /// A resolver that never redirects (the host namespace).
    pub const fn none() -> Self {
        Self { root: None }
    }

    /// The configured root, if redirection is active.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref().map(Path::new)
    }

    /// Whether paths are rewritten at all.
    pub fn is_redirected(&self) -> bool {
        self.root.is_some()
    }

    /// Convert a logical path into a physical one.
    ///
    /// Equivalent to [`resolve_bounded`](Self::resolve_bounded) with
    /// [`MAX_PATH_LEN`].
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.resolve_bounded(path, MAX_PATH_LEN)
    }

    /// Convert a logical path into a physical one, bounded to a buffer of
    /// `capacity` bytes.
    ///
    /// The result never exceeds `capacity - 1` bytes; longer results are
    /// truncated the way `snprintf` truncates into a fixed buffer.
    pub fn resolve_bounded(&self, path: impl AsRef<Path>, capacity: usize) -> PathBuf {
        let path = path.as_ref();
        let physical = concat_bounded(self.root.as_deref(), path, capacity);

        debug!(
            logical = %path.display(),
            physical = %physical.display(),
            "Rootfs path conversion"
        );

        physical
    }
}

#[cfg(unix)]
fn concat_bounded(root: Option<&std::ffi::OsStr>, path: &Path, capacity: usize) -> PathBuf {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let path = path.as_os_str().as_bytes();
    let mut bytes = Vec::with_capacity(root.map_or(0, |r| r.len()) + path.len());
    if let Some(root) = root {
        bytes.extend_from_slice(root.as_bytes());
    }
    bytes.extend_from_slice(path);
    bytes.truncate(capacity.saturating_sub(1));

    PathBuf::from(OsString::from_vec(bytes))
}

#[cfg(windows)]
fn concat_bounded(_root: Option<&std::ffi::OsStr>, path: &Path, _capacity: usize) -> PathBuf {
    path.to_path_buf()
}

// ============================================================================
// Process-wide setting
// ============================================================================

static ROOT_FILESYSTEM: OnceLock<RootFs> = OnceLock::new();
static NO_ROOT: RootFs = RootFs::none();

/// Install the process-wide root filesystem.
///
/// Intended to be called once during startup, before any path is resolved.
/// A second call fails and leaves the first setting in place.
pub fn set_root_filesystem(root: RootFs) -> FsprimsResult<()> {
    ROOT_FILESYSTEM
        .set(root)
        .map_err(|_| FsprimsError::invalid_argument("root filesystem is already configured"))
}

/// The process-wide root filesystem, or no redirection if none was installed.
pub fn root_filesystem() -> &'static RootFs {
    ROOT_FILESYSTEM.get().unwrap_or(&NO_ROOT)
}
