//! Providers for the current spec document and its versioned snapshots.
//!
//! Both read fresh from disk on every call. The core assumes well-formed
//! JSON; a structurally broken document fails with the generic parse error,
//! not a dedicated validation layer.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::{CoverageError, Result};

/// Title and version from the spec's `info` object.
#[derive(Debug, Clone, Serialize)]
pub struct SpecInfo {
    /// `info.title`, if present.
    pub title: Option<String>,
    /// `info.version`, if present.
    pub version: Option<String>,
}

/// Provider for the current OpenAPI document.
#[derive(Debug, Clone)]
pub struct SpecSource {
    path: PathBuf,
}

impl SpecSource {
    /// Create a source reading from `path`.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the document as raw text.
    pub fn read_text(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|source| CoverageError::SpecRead {
            path: self.path.clone(),
            source,
        })
    }

    /// Read and parse the document.
    pub fn load(&self) -> Result<Value> {
        parse_document(&self.path, &self.read_text()?)
    }

    /// Read the spec's title and version.
    pub fn info(&self) -> Result<SpecInfo> {
        let spec = self.load()?;
        let info = spec.get("info");
        let field = |name: &str| {
            info.and_then(|i| i.get(name))
                .and_then(Value::as_str)
                .map(str::to_owned)
        };
        Ok(SpecInfo {
            title: field("title"),
            version: field("version"),
        })
    }
}

/// Key-value-by-version store of historical spec documents.
///
/// Snapshots live under one directory as `<prefix>.<version>.json`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    prefix: String,
}

impl SnapshotStore {
    /// Create a store over `dir` with the given file-name prefix.
    #[must_use]
    pub fn new(dir: PathBuf, prefix: String) -> Self {
        Self { dir, prefix }
    }

    /// Path a given version resolves to.
    #[must_use]
    pub fn snapshot_path(&self, version: &str) -> PathBuf {
        self.dir.join(format!("{}.{version}.json", self.prefix))
    }

    /// Load the snapshot for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::SnapshotNotFound`] when no snapshot file
    /// exists for the version. This is the one place a user-supplied
    /// version string maps directly to a missing-resource failure.
    pub fn load(&self, version: &str) -> Result<Value> {
        let path = self.snapshot_path(version);
        if !path.exists() {
            return Err(CoverageError::SnapshotNotFound {
                version: version.to_owned(),
                path,
            });
        }
        let content = std::fs::read_to_string(&path).map_err(|source| CoverageError::SpecRead {
            path: path.clone(),
            source,
        })?;
        parse_document(&path, &content)
    }
}

fn parse_document(path: &Path, content: &str) -> Result<Value> {
    serde_json::from_str(content).map_err(|source| CoverageError::SpecParse {
        path: path.to_path_buf(),
        source,
    })
}
