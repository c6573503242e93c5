//! Provider for the implemented-endpoint registry.
//!
//! The reconciler never sees raw text; everything format-specific lives
//! here. Two source formats are supported behind the one provider:
//!
//! - a structured JSON file (array of records), the preferred format;
//! - a source-code scan recovering `new("METHOD", "/path", "api",
//!   "ClientMethod")` four-string tuples, for registries kept as a code
//!   file in the client project.
//!
//! An absent registry source is an empty registry, not an error: the
//! resulting all-missing coverage report is alarming but valid.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{CoverageError, Result};
use crate::reconcile::ImplementedEndpoint;

static TUPLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"new\s*\(\s*"([^"]+)"\s*,\s*"([^"]+)"\s*,\s*"([^"]+)"\s*,\s*"([^"]+)"\s*\)"#)
        .expect("tuple pattern is valid")
});

/// Registry provider over a single source file.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    path: PathBuf,
}

impl EndpointRegistry {
    /// Create a registry reading from `path`.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load every implemented-endpoint record from the source.
    ///
    /// `.json` sources are parsed as a structured array; anything else is
    /// scanned for tuple constructors. A missing file yields an empty
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::RegistryRead`] when an existing source
    /// cannot be read or, for JSON sources, parsed.
    pub fn load(&self) -> Result<Vec<ImplementedEndpoint>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "registry source absent, treating as empty");
            return Ok(Vec::new());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| CoverageError::RegistryRead {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        if self.path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| CoverageError::RegistryRead {
                path: self.path.clone(),
                message: e.to_string(),
            })
        } else {
            Ok(scan_source(&content))
        }
    }
}

/// Extract endpoint tuples from source text.
fn scan_source(content: &str) -> Vec<ImplementedEndpoint> {
    TUPLE_PATTERN
        .captures_iter(content)
        .map(|caps| ImplementedEndpoint {
            method: caps[1].to_owned(),
            path: caps[2].to_owned(),
            api: caps[3].to_owned(),
            client_method: caps[4].to_owned(),
        })
        .collect()
}
