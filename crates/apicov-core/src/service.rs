//! The caller-facing facade.
//!
//! [`CoverageService`] stitches the providers and the pure core together
//! into the operations the MCP layer (or any other host) exposes. It holds
//! nothing but configuration: every call re-reads its inputs and recomputes
//! from scratch, so concurrent invocations share no mutable state.

use crate::config::CoverageConfig;
use crate::diff::{diff_operation_keys, VersionDiff};
use crate::error::Result;
use crate::index::{index_operations, IndexFilter};
use crate::query::{self, OperationList, OperationLookup};
use crate::reconcile::{reconcile, CoverageReport};
use crate::registry::EndpointRegistry;
use crate::report::{run_coverage_script, ReportOutcome};
use crate::spec_source::{SnapshotStore, SpecInfo, SpecSource};

/// Stateless facade over one spec/registry/snapshot configuration.
#[derive(Debug, Clone)]
pub struct CoverageService {
    config: CoverageConfig,
}

impl CoverageService {
    /// Create a service over the given configuration.
    #[must_use]
    pub const fn new(config: CoverageConfig) -> Self {
        Self { config }
    }

    /// The configuration this service was built with.
    #[must_use]
    pub const fn config(&self) -> &CoverageConfig {
        &self.config
    }

    fn spec_source(&self) -> SpecSource {
        SpecSource::new(self.config.openapi.clone())
    }

    fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::new(
            self.config.snapshots_dir.clone(),
            self.config.snapshot_prefix.clone(),
        )
    }

    fn registry(&self) -> EndpointRegistry {
        EndpointRegistry::new(self.config.implemented_endpoints.clone())
    }

    /// Title and version of the current spec.
    pub fn spec_info(&self) -> Result<SpecInfo> {
        self.spec_source().info()
    }

    /// The current spec document as raw text, for resource exposure.
    pub fn openapi_text(&self) -> Result<String> {
        self.spec_source().read_text()
    }

    /// The generated coverage report text, `None` when not yet generated.
    pub fn coverage_report_text(&self) -> Result<Option<String>> {
        if !self.config.coverage_report.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(
            &self.config.coverage_report,
        )?))
    }

    /// Look up a single operation by method and path.
    pub fn get_operation(&self, method: &str, path: &str) -> Result<OperationLookup> {
        let spec = self.spec_source().load()?;
        Ok(query::get_operation(&spec, method, path))
    }

    /// List operations, optionally filtered by tag and deprecated inclusion.
    pub fn list_operations(&self, filter: &IndexFilter) -> Result<OperationList> {
        let spec = self.spec_source().load()?;
        Ok(query::list_operations(&spec, filter))
    }

    /// Diff two snapshot versions of the spec.
    ///
    /// # Errors
    ///
    /// Surfaces [`crate::CoverageError::SnapshotNotFound`] when either
    /// version has no stored snapshot.
    pub fn diff_versions(&self, from_version: &str, to_version: &str) -> Result<VersionDiff> {
        let store = self.snapshot_store();
        let from_spec = store.load(from_version)?;
        let to_spec = store.load(to_version)?;

        let filter = IndexFilter::everything();
        let from_index = index_operations(&from_spec, &filter);
        let to_index = index_operations(&to_spec, &filter);

        Ok(diff_operation_keys(
            from_version,
            to_version,
            &from_index,
            &to_index,
        ))
    }

    /// Reconcile the current spec against the implemented registry.
    pub fn coverage_gaps(&self, include_deprecated: bool) -> Result<CoverageReport> {
        let spec = self.spec_source().load()?;
        let filter = IndexFilter {
            include_deprecated,
            tag: None,
        };
        let openapi = index_operations(&spec, &filter);
        let implemented = self.registry().load()?;
        Ok(reconcile(&openapi, &implemented))
    }

    /// Run the external report-generation script.
    pub fn generate_report(&self) -> Result<ReportOutcome> {
        run_coverage_script(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoverageError;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Lay out a full fixture tree: spec, snapshots, registry source.
    fn fixture() -> (TempDir, CoverageService) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();

        write(
            &root.join("openapi/current.json"),
            &json!({
                "info": { "title": "Lichess API", "version": "2.0.107" },
                "paths": {
                    "/account": {
                        "get": { "summary": "Get my profile", "tags": ["Account"], "responses": { "200": {} } }
                    },
                    "/tournaments/{tournamentId}": {
                        "get": { "summary": "Get tournament", "tags": ["Broadcasts"], "responses": { "200": {} } }
                    },
                    "/puzzle/daily": {
                        "get": { "summary": "Daily puzzle", "tags": ["Puzzles"], "responses": { "200": {} } }
                    },
                    "/studies/{studyId}": {
                        "get": { "summary": "Export study", "deprecated": true, "tags": ["Studies"], "responses": { "200": {} } }
                    }
                }
            })
            .to_string(),
        );

        write(
            &root.join("openapi/snapshots/openapi.2.0.106.json"),
            &json!({ "paths": { "/account": { "get": {} }, "/old": { "get": {} } } }).to_string(),
        );
        write(
            &root.join("openapi/snapshots/openapi.2.0.107.json"),
            &json!({ "paths": { "/account": { "get": {} }, "/puzzle/daily": { "get": {} } } })
                .to_string(),
        );

        write(
            &root.join("src/ImplementedEndpoints.cs"),
            r#"
            new("GET", "/account", "lichess", "GetMyProfile"),
            new("GET", "/tournaments/{broadcastTournamentId}", "lichess", "GetBroadcastTournament"),
            new("GET", "/explorer/lookup", "explorer", "Lookup"),
            "#,
        );

        let config = CoverageConfig {
            openapi: root.join("openapi/current.json"),
            snapshots_dir: root.join("openapi/snapshots"),
            snapshot_prefix: "openapi".into(),
            implemented_endpoints: root.join("src/ImplementedEndpoints.cs"),
            coverage_report: root.join("docs/api-coverage.md"),
            coverage_script: root.join("scripts/coverage.ps1"),
            root,
        };
        (dir, CoverageService::new(config))
    }

    #[test]
    fn spec_info_reads_title_and_version() {
        let (_dir, service) = fixture();
        let info = service.spec_info().unwrap();
        assert_eq!(info.title.as_deref(), Some("Lichess API"));
        assert_eq!(info.version.as_deref(), Some("2.0.107"));
    }

    #[test]
    fn get_operation_round_trips() {
        let (_dir, service) = fixture();
        let lookup = service.get_operation("GET", "/account").unwrap();
        assert!(matches!(lookup, OperationLookup::Found(_)));

        let miss = service.get_operation("POST", "/account").unwrap();
        assert_eq!(
            miss.miss_message().as_deref(),
            Some("Method not found: POST /account")
        );
    }

    #[test]
    fn list_operations_hides_deprecated_by_default() {
        let (_dir, service) = fixture();
        let list = service.list_operations(&IndexFilter::default()).unwrap();
        assert_eq!(list.count, 3);
        assert!(list
            .operations
            .iter()
            .all(|o| o.key != "GET /studies/{studyId}"));

        let all = service.list_operations(&IndexFilter::everything()).unwrap();
        assert_eq!(all.count, 4);
    }

    #[test]
    fn diff_versions_reports_changes() {
        let (_dir, service) = fixture();
        let diff = service.diff_versions("2.0.106", "2.0.107").unwrap();
        assert_eq!(diff.added, ["GET /puzzle/daily"]);
        assert_eq!(diff.removed, ["GET /old"]);
    }

    #[test]
    fn diff_unknown_version_is_snapshot_not_found() {
        let (_dir, service) = fixture();
        let err = service.diff_versions("2.0.106", "0.0.0").unwrap_err();
        assert!(matches!(err, CoverageError::SnapshotNotFound { .. }));
    }

    #[test]
    fn coverage_gaps_categorize_the_fixture() {
        let (_dir, service) = fixture();
        let report = service.coverage_gaps(false).unwrap();

        assert_eq!(report.stats.open_api_total, 3);
        assert_eq!(report.stats.implemented_total, 3);

        let missing: Vec<&str> = report.missing.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(missing, ["GET /puzzle/daily"]);

        assert_eq!(report.path_variations.len(), 1);
        assert_eq!(
            report.path_variations[0].openapi,
            "GET /tournaments/{tournamentId}"
        );
        assert_eq!(
            report.path_variations[0].implemented,
            "GET /tournaments/{broadcastTournamentId}"
        );

        let extra: Vec<&str> = report.extra.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(extra, ["GET /explorer/lookup"]);
    }

    #[test]
    fn deprecated_operations_join_the_universe_when_included() {
        let (_dir, service) = fixture();
        let report = service.coverage_gaps(true).unwrap();
        assert_eq!(report.stats.open_api_total, 4);
        assert!(report
            .missing
            .iter()
            .any(|m| m.key == "GET /studies/{studyId}" && m.deprecated));
    }

    #[test]
    fn absent_registry_yields_all_missing() {
        let (dir, service) = fixture();
        std::fs::remove_file(dir.path().join("src/ImplementedEndpoints.cs")).unwrap();

        let report = service.coverage_gaps(false).unwrap();
        assert_eq!(report.stats.implemented_total, 0);
        assert_eq!(report.stats.missing_count, 3);
        assert!(report.extra.is_empty());
        assert!(report.path_variations.is_empty());
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let (_dir, service) = fixture();
        let a = serde_json::to_string(&service.coverage_gaps(false).unwrap()).unwrap();
        let b = serde_json::to_string(&service.coverage_gaps(false).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn coverage_report_text_absent_is_none() {
        let (dir, service) = fixture();
        assert!(service.coverage_report_text().unwrap().is_none());

        write(&dir.path().join("docs/api-coverage.md"), "# Coverage\n");
        assert_eq!(
            service.coverage_report_text().unwrap().as_deref(),
            Some("# Coverage\n")
        );
    }

    #[test]
    fn generate_report_without_script_errors() {
        let (_dir, service) = fixture();
        let err = service.generate_report().unwrap_err();
        assert!(matches!(err, CoverageError::ScriptNotFound(_)));
    }

    #[test]
    fn structured_json_registry_works_end_to_end() {
        let (dir, _service) = fixture();
        let root = dir.path().to_path_buf();
        write(
            &root.join("endpoints.json"),
            r#"[{ "method": "GET", "path": "/account", "api": "lichess", "clientMethod": "GetMyProfile" }]"#,
        );

        let config = CoverageConfig {
            openapi: root.join("openapi/current.json"),
            snapshots_dir: root.join("openapi/snapshots"),
            snapshot_prefix: "openapi".into(),
            implemented_endpoints: root.join("endpoints.json"),
            coverage_report: root.join("docs/api-coverage.md"),
            coverage_script: root.join("scripts/coverage.ps1"),
            root: root.clone(),
        };
        let service = CoverageService::new(config);

        let report = service.coverage_gaps(false).unwrap();
        assert_eq!(report.stats.implemented_total, 1);
        // /account matches exactly; the other two spec operations are missing.
        assert_eq!(report.stats.missing_count, 2);
    }

    #[test]
    fn version_diff_serializes_with_plain_keys() {
        let (_dir, service) = fixture();
        let diff = service.diff_versions("2.0.106", "2.0.107").unwrap();
        let value = serde_json::to_value(&diff).unwrap();
        assert_eq!(value["from"], "2.0.106");
        assert!(value["added"].is_array());
    }

    #[test]
    fn report_serializes_with_camel_case_stats() {
        let (_dir, service) = fixture();
        let report = service.coverage_gaps(false).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["stats"]["openApiTotal"].is_number());
        assert!(value["stats"]["pathVariationsCount"].is_number());
        assert!(value["pathVariations"].is_array());
    }
}
