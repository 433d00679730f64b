//! Error types for fsprims operations.
//!
//! This module defines the error taxonomy per ADR-0008:
//! - [`FsprimsError`] - Canonical error type for all fsprims operations
//!
//! ## Design Principles
//!
//! - **Structured**: Errors carry typed context (path, operation) not just messages
//! - **OS-transparent**: The underlying `io::Error` is kept as the source, so the
//!   OS error text always reaches the caller
//! - **Distinguishable**: Lock contention, unreadable PID files and malformed PID
//!   files are separate variants because callers react differently to each
//!
//! Paths are part of the messages. They are configuration values (PID file,
//! monitored files) and operators need them.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Canonical Error Type (per ADR-0008)
// ============================================================================

/// Canonical error type for all fsprims operations.
///
/// ## Exit Code Mapping
///
/// | Variant | Code |
/// |---------|------|
/// | `InvalidArgument` | 1 |
/// | `PermissionDenied` | 4 |
/// | `NotFound` | 5 |
/// | `NotSupported` | 6 |
/// | `Io` | 8 |
/// | `AlreadyRunning` | 10 |
/// | `PidFileOpen` | 11 |
/// | `PidFileCreate` | 12 |
/// | `PidFileParse` | 13 |
/// | `Internal` | 99 |
#[derive(Debug, Error)]
pub enum FsprimsError {
    /// Invalid argument provided.
    ///
    /// Returned when input validation fails (e.g., an unknown stream mode).
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of what was invalid.
        message: String,
    },

    /// The path does not exist.
    #[error("'{}' not found: {source}", path.display())]
    NotFound {
        /// Physical path that was looked up.
        path: PathBuf,
        /// The OS error (ENOENT, ERROR_FILE_NOT_FOUND, ...).
        #[source]
        source: io::Error,
    },

    /// Permission denied while operating on a path.
    #[error("Permission denied for '{operation}' on '{}': {source}", path.display())]
    PermissionDenied {
        /// Physical path of the denied operation.
        path: PathBuf,
        /// The operation that was denied (e.g., "open", "stat").
        operation: String,
        /// The OS error.
        #[source]
        source: io::Error,
    },

    /// Operation not supported on the current platform.
    ///
    /// Symbolic links and directory streams are POSIX-only capabilities.
    #[error("Operation '{feature}' not supported on {platform}")]
    NotSupported {
        /// The feature that is not supported.
        feature: String,
        /// The platform where it's not supported.
        platform: String,
    },

    /// Any other OS-level failure, with the OS error preserved.
    #[error("{operation} failed{}: {source}", on_path(.path))]
    Io {
        /// The operation that failed (e.g., "open", "read", "seek").
        operation: String,
        /// Physical path involved, empty for descriptor-only operations.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The PID file is locked by a live process.
    #[error(
        "Is this process already running? Could not lock PID file [{}]: {source}",
        path.display()
    )]
    AlreadyRunning {
        /// PID file path.
        path: PathBuf,
        /// The error returned by the lock attempt.
        #[source]
        source: io::Error,
    },

    /// The PID file exists but could not be opened.
    #[error("cannot open PID file [{}]: {source}", path.display())]
    PidFileOpen {
        /// PID file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The PID file could not be created or written.
    #[error("cannot create PID file [{}]: {source}", path.display())]
    PidFileCreate {
        /// PID file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The PID file content is not a process identifier.
    #[error("cannot retrieve PID from file [{}]", path.display())]
    PidFileParse {
        /// PID file path.
        path: PathBuf,
    },

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

fn on_path(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        String::new()
    } else {
        format!(" for '{}'", path.display())
    }
}

impl FsprimsError {
    /// Get the numeric code for this error.
    ///
    /// The CLI uses it as its process exit code.
    pub fn error_code(&self) -> i32 {
        match self {
            FsprimsError::InvalidArgument { .. } => 1,
            FsprimsError::PermissionDenied { .. } => 4,
            FsprimsError::NotFound { .. } => 5,
            FsprimsError::NotSupported { .. } => 6,
            FsprimsError::Io { .. } => 8,
            FsprimsError::AlreadyRunning { .. } => 10,
            FsprimsError::PidFileOpen { .. } => 11,
            FsprimsError::PidFileCreate { .. } => 12,
            FsprimsError::PidFileParse { .. } => 13,
            FsprimsError::Internal { .. } => 99,
        }
    }

    /// The raw OS error code behind this error, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            FsprimsError::NotFound { source, .. }
            | FsprimsError::PermissionDenied { source, .. }
            | FsprimsError::Io { source, .. }
            | FsprimsError::AlreadyRunning { source, .. }
            | FsprimsError::PidFileOpen { source, .. }
            | FsprimsError::PidFileCreate { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl FsprimsError {
    /// Create an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        FsprimsError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a `NotFound` error.
    pub fn not_found(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FsprimsError::NotFound {
            path: path.into(),
            source,
        }
    }

    /// Create a `PermissionDenied` error.
    pub fn permission_denied(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: io::Error,
    ) -> Self {
        FsprimsError::PermissionDenied {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a `NotSupported` error.
    pub fn not_supported(feature: impl Into<String>, platform: impl Into<String>) -> Self {
        FsprimsError::NotSupported {
            feature: feature.into(),
            platform: platform.into(),
        }
    }

    /// Create an `Io` error without classifying the error kind.
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        FsprimsError::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Classify an IO error from a path operation.
    ///
    /// `NotFound` and `PermissionDenied` kinds become their structured
    /// variants, everything else becomes `Io`. The OS error is kept as the
    /// source in every case.
    pub fn from_io(operation: &str, path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => FsprimsError::not_found(path, source),
            io::ErrorKind::PermissionDenied => {
                FsprimsError::permission_denied(path, operation, source)
            }
            _ => FsprimsError::io(operation, path, source),
        }
    }

    /// Create an `AlreadyRunning` error.
    pub fn already_running(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FsprimsError::AlreadyRunning {
            path: path.into(),
            source,
        }
    }

    /// Create a `PidFileOpen` error.
    pub fn pid_file_open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FsprimsError::PidFileOpen {
            path: path.into(),
            source,
        }
    }

    /// Create a `PidFileCreate` error.
    pub fn pid_file_create(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FsprimsError::PidFileCreate {
            path: path.into(),
            source,
        }
    }

    /// Create a `PidFileParse` error.
    pub fn pid_file_parse(path: impl Into<PathBuf>) -> Self {
        FsprimsError::PidFileParse { path: path.into() }
    }

    /// Create an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        FsprimsError::Internal {
            message: message.into(),
        }
    }
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for fsprims operations.
pub type FsprimsResult<T> = Result<T, FsprimsError>;

// ============================================================================
// Tests
// ============================================================================
