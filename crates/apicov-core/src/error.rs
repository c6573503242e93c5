//! Unified error types for the apicov core library.
//!
//! Expected not-found conditions on the query path (unknown operation path,
//! unknown method) are modelled as structured results, not errors; the
//! variants here cover missing resources and I/O, the cases a caller cannot
//! express as a normal answer.

use std::path::PathBuf;

use thiserror::Error;

/// The unified error type for all apicov operations.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// The configuration anchor file was not found at the expected path.
    #[error("Configuration file not found at: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration anchor file exists but could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// The OpenAPI document could not be read from disk.
    #[error("Failed to read OpenAPI document {}: {source}", .path.display())]
    SpecRead {
        /// Path of the document that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The OpenAPI document was read but is not valid JSON.
    #[error("Failed to parse OpenAPI document {}: {source}", .path.display())]
    SpecParse {
        /// Path of the document that failed to parse.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A requested spec snapshot version does not exist.
    #[error("Snapshot not found for version '{version}': {}", .path.display())]
    SnapshotNotFound {
        /// The version string the caller asked for.
        version: String,
        /// The path that was probed.
        path: PathBuf,
    },

    /// The implemented-endpoint registry exists but could not be read or parsed.
    #[error("Failed to read endpoint registry {}: {message}", .path.display())]
    RegistryRead {
        /// Path of the registry source.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The coverage generator script is missing.
    #[error("Coverage script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    /// No usable shell was found to run the coverage script.
    #[error("PowerShell not found. Tried: {tried}")]
    ShellNotFound {
        /// The shells that were attempted, comma separated.
        tried: String,
    },

    /// A low-level I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for apicov operations.
pub type Result<T> = std::result::Result<T, CoverageError>;

impl CoverageError {
    /// Returns `true` if this error represents a missing resource the caller
    /// named directly (a snapshot version, config anchor, or script path).
    #[inline]
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_) | Self::SnapshotNotFound { .. } | Self::ScriptNotFound(_)
        )
    }
}
