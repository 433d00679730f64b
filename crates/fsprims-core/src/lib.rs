//! fsprims-core: Core types, errors, and platform detection
//!
//! This crate provides the foundational types used across all fsprims modules:
//! - Error types per ADR-0008
//! - Schema ID constants for JSON output contracts
//! - Re-exports from rsfulmen for exit code constants
//! - The platform name used in `NotSupported` errors
//!
//! ## Error Handling
//!
//! fsprims uses a single canonical error type [`FsprimsError`]. Lock
//! contention, unreadable PID files and malformed PID files are separate
//! variants so callers can tell them apart without parsing messages.

use std::env::consts::OS;

pub mod error;
pub mod schema;

// Re-export canonical error type at crate root
pub use error::{FsprimsError, FsprimsResult};

// Re-export rsfulmen foundry exit codes for ecosystem alignment
pub use rsfulmen::foundry::exit_codes;

// ============================================================================
// Platform Detection
// ============================================================================

/// Get the current platform identifier.
///
/// Returns one of: "linux", "macos", "windows", "freebsd", etc. Used as
/// the `platform` of [`FsprimsError::NotSupported`].
#[inline]
pub fn get_platform() -> &'static str {
    OS
}
