//! # apicov-core
//!
//! Core logic for apicov: reconciling an OpenAPI document against a
//! registry of client-side implemented endpoints.
//!
//! This crate provides:
//! - Path-template normalization (collapse parameter names to one token)
//! - Flattening a spec document into an operation index
//! - Endpoint reconciliation (missing / path-variation / extra)
//! - Snapshot diffing between spec versions
//! - Read-only operation queries
//!
//! ## Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`normalize`] - Canonical form for path templates
//! - [`index`] - Flattening the spec into operation records
//! - [`reconcile`] - The coverage reconciliation engine
//! - [`diff`] - Set-algebra diff between spec snapshots
//! - [`query`] - Read-only single/list operation lookups
//! - [`config`] - Explicit configuration for all file sources
//! - [`spec_source`] - Spec document and snapshot providers
//! - [`registry`] - Implemented-endpoint registry provider
//! - [`report`] - External report-script invocation
//! - [`service`] - The facade hosts call into
//! - [`error`] - Unified error types for the crate
//!
//! Every operation is stateless: inputs are re-read and results recomputed
//! on each call, so nothing needs locking even under concurrent callers.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod config;
pub mod diff;
pub mod error;
pub mod index;
pub mod normalize;
pub mod query;
pub mod reconcile;
pub mod registry;
pub mod report;
pub mod service;
pub mod spec_source;

// Re-export primary types for convenience
pub use config::CoverageConfig;
pub use diff::{diff_operation_keys, VersionDiff};
pub use error::{CoverageError, Result};
pub use index::{index_operations, operation_key, IndexFilter, OperationRecord};
pub use normalize::{normalize_path, PLACEHOLDER};
pub use query::{get_operation, list_operations, OperationList, OperationLookup, OperationSummary};
pub use reconcile::{
    reconcile, CoverageReport, CoverageStats, ExtraEndpoint, ImplementedEndpoint, MissingEndpoint,
    PathVariation,
};
pub use registry::EndpointRegistry;
pub use report::{run_coverage_script, ReportOutcome};
pub use service::CoverageService;
pub use spec_source::{SnapshotStore, SpecInfo, SpecSource};
