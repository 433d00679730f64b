//! Schema ID constants for JSON output contracts.
//!
//! Every JSON document printed by the `fsprims` CLI carries a `schema_id`
//! field referencing one of the constants below.
//!
//! ## URI Structure
//!
//! ```text
//! https://schemas.3leaps.dev/<module>/<topic>/<version>/<filename>
//! ```
//!
//! Where:
//! - `module` = `fsprims`
//! - `topic` = feature area (`fs`, `line`, `pidfile`, `sysinfo`)
//! - `version` = SemVer (e.g., `v1.0.0`)
//! - `filename` = schema file with `.schema.json` suffix
//!
//! Schemas are not validated at runtime; output shape is covered by CLI tests.

/// Schema ID for path resolution output (v1.0.0).
///
/// This schema defines the structure of `fsprims resolve` output: the root,
/// the logical path and the physical path it maps to.
///
/// Schema location: `schemas/fs/v1.0.0/path-resolution.schema.json`
pub const PATH_RESOLUTION_V1: &str =
    "https://schemas.3leaps.dev/fsprims/fs/v1.0.0/path-resolution.schema.json";

/// Schema ID for file status output (v1.0.0).
///
/// This schema defines the structure of `fsprims stat` output.
///
/// Schema location: `schemas/fs/v1.0.0/file-status.schema.json`
pub const FILE_STATUS_V1: &str =
    "https://schemas.3leaps.dev/fsprims/fs/v1.0.0/file-status.schema.json";

/// Schema ID for directory listing output (v1.0.0).
///
/// Schema location: `schemas/fs/v1.0.0/dir-listing.schema.json`
pub const DIR_LISTING_V1: &str =
    "https://schemas.3leaps.dev/fsprims/fs/v1.0.0/dir-listing.schema.json";

/// Schema ID for line-read output (v1.0.0).
///
/// This schema defines the structure of `fsprims lines` output: the lines
/// read, their byte offsets and the offset to resume from.
///
/// Schema location: `schemas/line/v1.0.0/line-read.schema.json`
pub const LINE_READ_V1: &str =
    "https://schemas.3leaps.dev/fsprims/line/v1.0.0/line-read.schema.json";

/// Schema ID for PID file status output (v1.0.0).
///
/// Schema location: `schemas/pidfile/v1.0.0/pid-file-status.schema.json`
pub const PID_FILE_STATUS_V1: &str =
    "https://schemas.3leaps.dev/fsprims/pidfile/v1.0.0/pid-file-status.schema.json";

/// Schema ID for boot time output (v1.0.0).
///
/// Schema location: `schemas/sysinfo/v1.0.0/boot-time.schema.json`
pub const BOOT_TIME_V1: &str =
    "https://schemas.3leaps.dev/fsprims/sysinfo/v1.0.0/boot-time.schema.json";

// ============================================================================
// Schema Host Constants
// ============================================================================

/// Base URL for fsprims schemas.
pub const SCHEMA_HOST: &str = "https://schemas.3leaps.dev";

/// Module name for fsprims in schema URIs.
pub const SCHEMA_MODULE: &str = "fsprims";
