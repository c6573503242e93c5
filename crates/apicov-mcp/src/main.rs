//! Apicov MCP Server
//!
//! Exposes the apicov coverage-analysis core over an MCP stdio transport:
//! tools for querying the OpenAPI document, diffing spec snapshots,
//! computing coverage gaps against the implemented-endpoint registry, and
//! regenerating the coverage report; resources for the raw spec and the
//! generated report.
//!
//! # Environment Variables
//!
//! - `APICOV_CONFIG`: Required. Path to the JSON configuration anchor file
//! - `RUST_LOG`: Optional. Logging level (default: info)

use anyhow::{Context, Result};
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars,
    service::{RequestContext, RoleServer},
    tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{error, info};

use apicov_core::{
    CoverageConfig, CoverageError, CoverageService, IndexFilter, OperationLookup, OperationRecord,
};

/// Environment variable names
mod env_vars {
    pub const CONFIG_PATH: &str = "APICOV_CONFIG";
}

/// Resource URIs served by this process
mod resources {
    pub const OPENAPI: &str = "apicov://openapi";
    pub const COVERAGE: &str = "apicov://coverage";
}

/// Shown for the coverage resource before the report has been generated.
const REPORT_PLACEHOLDER: &str = "# Endpoint coverage report not generated yet.\n";

/// Custom error types for the MCP server
#[derive(Debug, thiserror::Error)]
pub enum ApicovMcpError {
    #[error("APICOV_CONFIG environment variable is not set")]
    ConfigPathNotSet,

    #[error("APICOV_CONFIG is empty")]
    ConfigPathEmpty,
}

/// Configuration for the MCP server process itself
#[derive(Debug, Clone)]
pub struct McpConfig {
    /// Path to the JSON anchor file with all document locations
    pub anchor_path: std::path::PathBuf,
}

impl McpConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ApicovMcpError> {
        let anchor = std::env::var(env_vars::CONFIG_PATH)
            .map_err(|_| ApicovMcpError::ConfigPathNotSet)?;

        if anchor.trim().is_empty() {
            return Err(ApicovMcpError::ConfigPathEmpty);
        }

        Ok(Self {
            anchor_path: anchor.into(),
        })
    }
}

// Tool parameter types

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetOperationArgs {
    /// HTTP method (e.g. 'GET', 'post'); matched case-insensitively
    pub method: String,
    /// Path template exactly as it appears in the spec (e.g. '/account')
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListOperationsArgs {
    /// Only list operations carrying this tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Include operations marked deprecated (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_deprecated: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DiffVersionsArgs {
    /// Snapshot version to diff from (e.g. '2.0.106')
    pub from_version: String,
    /// Snapshot version to diff to (e.g. '2.0.107')
    pub to_version: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetCoverageGapsArgs {
    /// Include deprecated spec operations in the comparison (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_deprecated: Option<bool>,
}

// Response envelopes

#[derive(Serialize)]
struct FoundOperation<'a> {
    found: bool,
    #[serde(flatten)]
    operation: &'a OperationRecord,
}

#[derive(Serialize)]
struct NotFoundEnvelope {
    found: bool,
    error: String,
}

#[derive(Serialize)]
struct OkEnvelope<T: Serialize> {
    ok: bool,
    #[serde(flatten)]
    value: T,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    ok: bool,
    error: String,
}

/// Serialize a value as pretty JSON tool output.
fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization failed: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn tool_error(message: String) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message)])
}

/// The MCP server handler for apicov
#[derive(Clone)]
pub struct ApicovMcpServer {
    service: CoverageService,
    tool_router: ToolRouter<ApicovMcpServer>,
}

#[tool_router]
impl ApicovMcpServer {
    pub fn new(service: CoverageService) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }

    /// Return the OpenAPI spec title and version
    #[tool(description = "Return the title and version of the current OpenAPI document.")]
    async fn get_openapi_version(&self) -> Result<CallToolResult, McpError> {
        match self.service.spec_info() {
            Ok(info) => json_result(&info),
            Err(e) => Ok(tool_error(format!("Failed to read OpenAPI document: {e}"))),
        }
    }

    /// Look up one operation by method and path
    #[tool(description = "Look up a single operation from the OpenAPI spec by HTTP method and path. Returns summary, tags, deprecated flag, parameters, request body schema and response codes.")]
    async fn get_operation(
        &self,
        Parameters(args): Parameters<GetOperationArgs>,
    ) -> Result<CallToolResult, McpError> {
        let lookup = match self.service.get_operation(&args.method, &args.path) {
            Ok(lookup) => lookup,
            Err(e) => return Ok(tool_error(format!("Failed to read OpenAPI document: {e}"))),
        };

        match lookup {
            OperationLookup::Found(operation) => json_result(&FoundOperation {
                found: true,
                operation: &operation,
            }),
            miss => json_result(&NotFoundEnvelope {
                found: false,
                error: miss.miss_message().unwrap_or_default(),
            }),
        }
    }

    /// List all operations, optionally filtered
    #[tool(description = "List all operations in the OpenAPI spec, optionally filtered by tag and optionally including deprecated operations. Sorted by operation key.")]
    async fn list_operations(
        &self,
        Parameters(args): Parameters<ListOperationsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let filter = IndexFilter {
            include_deprecated: args.include_deprecated.unwrap_or(false),
            tag: args.tag,
        };
        match self.service.list_operations(&filter) {
            Ok(list) => json_result(&list),
            Err(e) => Ok(tool_error(format!("Failed to read OpenAPI document: {e}"))),
        }
    }

    /// Diff two spec snapshot versions
    #[tool(description = "Compare two snapshot versions of the OpenAPI spec (e.g. 2.0.106 -> 2.0.107) and return added and removed operation keys.")]
    async fn diff_openapi_versions(
        &self,
        Parameters(args): Parameters<DiffVersionsArgs>,
    ) -> Result<CallToolResult, McpError> {
        match self.service.diff_versions(&args.from_version, &args.to_version) {
            Ok(diff) => json_result(&OkEnvelope {
                ok: true,
                value: diff,
            }),
            Err(e) if e.is_not_found() => json_result(&ErrorEnvelope {
                ok: false,
                error: e.to_string(),
            }),
            Err(e) => Ok(tool_error(format!("Failed to diff versions: {e}"))),
        }
    }

    /// Compute coverage gaps between the spec and the implemented registry
    #[tool(description = "Compare the OpenAPI spec with the implemented-endpoint registry to find coverage gaps. Returns missing endpoints (true gaps), path variations (parameter naming differences only), extra endpoints (implemented but not in the spec, e.g. external APIs) and summary statistics.")]
    async fn get_coverage_gaps(
        &self,
        Parameters(args): Parameters<GetCoverageGapsArgs>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .service
            .coverage_gaps(args.include_deprecated.unwrap_or(false))
        {
            Ok(report) => json_result(&report),
            Err(e) => Ok(tool_error(format!("Failed to compute coverage gaps: {e}"))),
        }
    }

    /// Regenerate the coverage report artifact
    #[tool(description = "Run the repository's coverage generator script to regenerate the coverage report. Blocking call; returns the script's exit code and captured output.")]
    async fn generate_coverage_report(&self) -> Result<CallToolResult, McpError> {
        // The script can run for a while; keep the async runtime responsive.
        let service = self.service.clone();
        let outcome = tokio::task::spawn_blocking(move || service.generate_report())
            .await
            .map_err(|e| McpError::internal_error(format!("Report task failed: {e}"), None))?;

        match outcome {
            Ok(outcome) => json_result(&outcome),
            Err(
                e @ (CoverageError::ScriptNotFound(_) | CoverageError::ShellNotFound { .. }),
            ) => json_result(&ErrorEnvelope {
                ok: false,
                error: e.to_string(),
            }),
            Err(e) => Ok(tool_error(format!("Failed to run coverage script: {e}"))),
        }
    }
}

#[tool_handler]
impl ServerHandler for ApicovMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "apicov-mcp".to_string(),
                title: Some("Apicov MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: Some("https://github.com/apicov/apicov".to_string()),
            },
            instructions: Some(
                "Apicov MCP Server - analyze OpenAPI endpoint coverage. \
                \n\nTools available:\
                \n- get_openapi_version: spec title and version\
                \n- get_operation: one operation's full metadata by method and path\
                \n- list_operations: all operations, filterable by tag\
                \n- diff_openapi_versions: added/removed operations between two snapshots\
                \n- get_coverage_gaps: missing / path-variation / extra endpoints vs the registry\
                \n- generate_coverage_report: regenerate the coverage report artifact\
                \n\nResources:\
                \n- apicov://openapi: the raw OpenAPI document\
                \n- apicov://coverage: the generated coverage report"
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let mut openapi = RawResource::new(resources::OPENAPI, "openapi".to_string());
        openapi.description = Some("The current OpenAPI spec JSON".to_string());
        openapi.mime_type = Some("application/json".to_string());

        let mut coverage = RawResource::new(resources::COVERAGE, "coverage".to_string());
        coverage.description = Some("The endpoint coverage report markdown".to_string());
        coverage.mime_type = Some("text/markdown".to_string());

        Ok(ListResourcesResult {
            meta: None,
            resources: vec![openapi.no_annotation(), coverage.no_annotation()],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        match request.uri.as_str() {
            resources::OPENAPI => {
                let text = self
                    .service
                    .openapi_text()
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?;
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(text, resources::OPENAPI)],
                })
            }
            resources::COVERAGE => {
                let text = self
                    .service
                    .coverage_report_text()
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?
                    .unwrap_or_else(|| REPORT_PLACEHOLDER.to_string());
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(text, resources::COVERAGE)],
                })
            }
            other => Err(McpError::resource_not_found(
                format!("Unknown resource: {other}"),
                None,
            )),
        }
    }
}

/// Setup signal handlers for graceful shutdown
fn setup_signal_handlers() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT handler");
            let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler");

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating shutdown...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating shutdown...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.expect("Ctrl+C handler");
            info!("Received Ctrl+C, initiating shutdown...");
        }

        let _ = tx.send(());
    });

    rx
}

/// Initialize logging
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info")
            .add_directive("apicov_mcp=debug".parse().expect("valid directive"))
            .add_directive("rmcp=info".parse().expect("valid directive"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("Apicov MCP Server starting...");

    let mcp_config = McpConfig::from_env().context("Failed to load configuration")?;
    let coverage_config = CoverageConfig::load(&mcp_config.anchor_path)
        .with_context(|| format!("Failed to load anchor {}", mcp_config.anchor_path.display()))?;

    info!(
        "Configuration loaded: openapi={}, registry={}",
        coverage_config.openapi.display(),
        coverage_config.implemented_endpoints.display()
    );

    let shutdown_rx = setup_signal_handlers();

    let service = CoverageService::new(coverage_config);
    let mcp_server = ApicovMcpServer::new(service);

    info!("Starting MCP server with stdio transport");

    let transport = rmcp::transport::stdio();

    tokio::select! {
        result = mcp_server.serve(transport) => {
            match result {
                Ok(ct) => {
                    info!("MCP server running, waiting for completion...");
                    if let Err(e) = ct.waiting().await {
                        error!("MCP server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to start MCP server: {}", e);
                }
            }
        }
        _ = shutdown_rx => {
            info!("Shutdown signal received");
        }
    }

    info!("Apicov MCP Server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test covering all cases: the variable is process-global state.
    #[test]
    fn test_config_from_env() {
        std::env::remove_var(env_vars::CONFIG_PATH);
        assert!(matches!(
            McpConfig::from_env(),
            Err(ApicovMcpError::ConfigPathNotSet)
        ));

        std::env::set_var(env_vars::CONFIG_PATH, "  ");
        assert!(matches!(
            McpConfig::from_env(),
            Err(ApicovMcpError::ConfigPathEmpty)
        ));

        std::env::set_var(env_vars::CONFIG_PATH, "/etc/apicov/apicov.json");
        let config = McpConfig::from_env().unwrap();
        assert_eq!(
            config.anchor_path,
            std::path::PathBuf::from("/etc/apicov/apicov.json")
        );
        std::env::remove_var(env_vars::CONFIG_PATH);
    }

    #[test]
    fn test_not_found_envelope_shape() {
        let envelope = NotFoundEnvelope {
            found: false,
            error: "Path not found: /nope".into(),
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["found"], false);
        assert_eq!(value["error"], "Path not found: /nope");
    }

    #[test]
    fn test_ok_envelope_flattens_value() {
        #[derive(Serialize)]
        struct Inner {
            added: Vec<String>,
        }
        let envelope = OkEnvelope {
            ok: true,
            value: Inner {
                added: vec!["GET /a".into()],
            },
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["added"][0], "GET /a");
    }
}
