//! Explicit configuration for all file-backed collaborators.
//!
//! There is no process-global state: the anchor file is loaded once by the
//! caller and the resulting [`CoverageConfig`] is handed to each component
//! at construction time, so everything stays testable with in-memory or
//! tempdir substitutes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoverageError, Result};

fn default_snapshot_prefix() -> String {
    "openapi".to_owned()
}

/// Locations of every external document the service reads or writes.
///
/// Loaded from a JSON anchor file (see [`CoverageConfig::load`]) or built
/// directly in tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageConfig {
    /// The current OpenAPI document.
    pub openapi: PathBuf,

    /// Directory holding versioned spec snapshots.
    pub snapshots_dir: PathBuf,

    /// File-name prefix of snapshot files: `<prefix>.<version>.json`.
    #[serde(default = "default_snapshot_prefix")]
    pub snapshot_prefix: String,

    /// The implemented-endpoint registry source.
    pub implemented_endpoints: PathBuf,

    /// Where the generated coverage report lands.
    pub coverage_report: PathBuf,

    /// The external report-generation script.
    pub coverage_script: PathBuf,

    /// Directory the anchor file lives in; working directory for the
    /// report script. Set during [`CoverageConfig::load`].
    #[serde(skip)]
    pub root: PathBuf,
}

impl CoverageConfig {
    /// Load configuration from a JSON anchor file.
    ///
    /// Relative paths in the file are resolved against the anchor's own
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::ConfigNotFound`] when the anchor is absent
    /// and [`CoverageError::ConfigParse`] when it is not valid JSON.
    pub fn load(anchor: &Path) -> Result<Self> {
        if !anchor.exists() {
            return Err(CoverageError::ConfigNotFound(anchor.to_path_buf()));
        }
        let content = std::fs::read_to_string(anchor)?;
        let mut config: Self =
            serde_json::from_str(&content).map_err(|e| CoverageError::ConfigParse(e.to_string()))?;

        let root = anchor.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        config.openapi = resolve(&root, &config.openapi);
        config.snapshots_dir = resolve(&root, &config.snapshots_dir);
        config.implemented_endpoints = resolve(&root, &config.implemented_endpoints);
        config.coverage_report = resolve(&root, &config.coverage_report);
        config.coverage_script = resolve(&root, &config.coverage_script);
        config.root = root;

        Ok(config)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_anchor_and_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let anchor = dir.path().join("apicov.json");
        std::fs::write(
            &anchor,
            r#"{
                "openapi": "openapi/current.json",
                "snapshotsDir": "openapi/snapshots",
                "implementedEndpoints": "src/ImplementedEndpoints.cs",
                "coverageReport": "docs/api-coverage.md",
                "coverageScript": "scripts/coverage.ps1"
            }"#,
        )
        .unwrap();

        let config = CoverageConfig::load(&anchor).unwrap();
        assert_eq!(config.openapi, dir.path().join("openapi/current.json"));
        assert_eq!(config.snapshots_dir, dir.path().join("openapi/snapshots"));
        assert_eq!(config.snapshot_prefix, "openapi");
        assert_eq!(config.root, dir.path());
    }

    #[test]
    fn absolute_paths_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let anchor = dir.path().join("apicov.json");
        std::fs::write(
            &anchor,
            r#"{
                "openapi": "/abs/openapi.json",
                "snapshotsDir": "/abs/snapshots",
                "snapshotPrefix": "lichess.openapi",
                "implementedEndpoints": "/abs/endpoints.json",
                "coverageReport": "/abs/report.md",
                "coverageScript": "/abs/coverage.ps1"
            }"#,
        )
        .unwrap();

        let config = CoverageConfig::load(&anchor).unwrap();
        assert_eq!(config.openapi, PathBuf::from("/abs/openapi.json"));
        assert_eq!(config.snapshot_prefix, "lichess.openapi");
    }

    #[test]
    fn missing_anchor_is_config_not_found() {
        let err = CoverageConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, CoverageError::ConfigNotFound(_)));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let anchor = dir.path().join("apicov.json");
        std::fs::write(&anchor, "not json at all").unwrap();

        let err = CoverageConfig::load(&anchor).unwrap_err();
        assert!(matches!(err, CoverageError::ConfigParse(_)));
    }
}
