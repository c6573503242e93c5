//! Endpoint reconciliation between the OpenAPI index and the implemented
//! registry.
//!
//! Produces the coverage picture: operations implemented exactly, operations
//! implemented under a differently-named path parameter, operations with no
//! implementation at all, and implemented endpoints the spec never mentions
//! (assumed external/auxiliary APIs, not defects).

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::index::{operation_key, OperationRecord};
use crate::normalize::normalize_path;

/// One endpoint the client side claims to implement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementedEndpoint {
    /// HTTP method.
    pub method: String,
    /// Path template, parameter names as the client spells them.
    pub path: String,
    /// Identifier of the API the endpoint belongs to (e.g. `lichess`,
    /// `explorer`, `tablebase`).
    pub api: String,
    /// Name of the client method that implements the endpoint.
    pub client_method: String,
}

impl ImplementedEndpoint {
    /// Exact operation key, `"<METHOD> <PATH>"`.
    #[must_use]
    pub fn key(&self) -> String {
        operation_key(&self.method, &self.path)
    }

    /// Key after path normalization, used for variation matching.
    #[must_use]
    pub fn normalized_key(&self) -> String {
        format!(
            "{} {}",
            self.method.to_uppercase(),
            normalize_path(&self.path)
        )
    }
}

/// Aggregate counts over one reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageStats {
    /// OpenAPI operations considered (after deprecated filtering).
    pub open_api_total: usize,
    /// Distinct implemented endpoints, keyed by exact operation key.
    pub implemented_total: usize,
    /// Operations with no implementation, exact or normalized.
    pub missing_count: usize,
    /// Operations matched only after path normalization.
    pub path_variations_count: usize,
    /// Implemented endpoints absent from the spec under any normalization.
    pub extra_count: usize,
}

/// An OpenAPI operation with no implemented counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingEndpoint {
    /// Operation key.
    pub key: String,
    /// Operation summary, if the spec carries one.
    pub summary: Option<String>,
    /// Operation tags.
    pub tags: Vec<String>,
    /// Whether the spec marks the operation deprecated.
    pub deprecated: bool,
}

/// An OpenAPI operation matched to an implementation only after
/// normalization - same shape, different parameter names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathVariation {
    /// The OpenAPI operation key.
    pub openapi: String,
    /// The implemented key it matched after normalization.
    pub implemented: String,
    /// Summary of the OpenAPI operation.
    pub summary: Option<String>,
    /// Tags of the OpenAPI operation.
    pub tags: Vec<String>,
}

/// An implemented endpoint the spec does not describe under any
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraEndpoint {
    /// Exact operation key of the implemented endpoint.
    pub key: String,
    /// API identifier from the registry record.
    pub api: String,
    /// Client method name, preserved verbatim from the registry.
    #[serde(rename = "method")]
    pub client_method: String,
}

/// The full result of one reconciliation run.
///
/// The OpenAPI operation set partitions into exactly
/// {exact-matched} ∪ {path-variation} ∪ {missing}; exact matches are not
/// surfaced individually, only counted through `stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    /// Aggregate counts.
    pub stats: CoverageStats,
    /// True gaps, sorted by key.
    pub missing: Vec<MissingEndpoint>,
    /// Parameter-naming mismatches, sorted by OpenAPI key.
    pub path_variations: Vec<PathVariation>,
    /// Implemented-but-unspecified endpoints, sorted by key.
    pub extra: Vec<ExtraEndpoint>,
}

/// Reconcile the flat OpenAPI operation index against the implemented
/// registry.
///
/// For each OpenAPI operation: exact key match wins, then normalized-key
/// match (reported as a path variation), else the operation is missing.
/// Implemented endpoints whose exact and normalized keys both miss the
/// spec's key universe are reported as extra.
///
/// If two implemented endpoints normalize to the same key, the later record
/// wins the variation-lookup slot. That index is auxiliary - consulted only
/// when an exact match already failed - so last-write-wins is intentional
/// and kept. Multiple OpenAPI operations of the same shape each perform
/// their own lookup and may all match the same implemented entry.
///
/// An empty registry is a valid input: every OpenAPI operation comes back
/// missing and `extra` is empty.
#[must_use]
pub fn reconcile(
    openapi: &BTreeMap<String, OperationRecord>,
    implemented: &[ImplementedEndpoint],
) -> CoverageReport {
    let exact: HashMap<String, &ImplementedEndpoint> =
        implemented.iter().map(|e| (e.key(), e)).collect();

    let mut by_normalized: HashMap<String, String> = HashMap::new();
    for endpoint in implemented {
        by_normalized.insert(endpoint.normalized_key(), endpoint.key());
    }

    let mut missing = Vec::new();
    let mut path_variations = Vec::new();

    for (key, op) in openapi {
        if exact.contains_key(key) {
            continue;
        }

        if let Some(impl_key) = by_normalized.get(&op.normalized_key()) {
            path_variations.push(PathVariation {
                openapi: key.clone(),
                implemented: impl_key.clone(),
                summary: op.summary.clone(),
                tags: op.tags.clone(),
            });
        } else {
            missing.push(MissingEndpoint {
                key: key.clone(),
                summary: op.summary.clone(),
                tags: op.tags.clone(),
                deprecated: op.deprecated,
            });
        }
    }

    // Extra is judged against the spec's full normalized-key universe,
    // independent of the per-operation pairing above.
    let openapi_normalized: HashSet<String> =
        openapi.values().map(OperationRecord::normalized_key).collect();

    let mut extra: Vec<ExtraEndpoint> = Vec::new();
    for (key, endpoint) in &exact {
        if openapi.contains_key(key) {
            continue;
        }
        if openapi_normalized.contains(&endpoint.normalized_key()) {
            continue;
        }
        extra.push(ExtraEndpoint {
            key: key.clone(),
            api: endpoint.api.clone(),
            client_method: endpoint.client_method.clone(),
        });
    }

    missing.sort_by(|a, b| a.key.cmp(&b.key));
    path_variations.sort_by(|a, b| a.openapi.cmp(&b.openapi));
    extra.sort_by(|a, b| a.key.cmp(&b.key));

    CoverageReport {
        stats: CoverageStats {
            open_api_total: openapi.len(),
            implemented_total: exact.len(),
            missing_count: missing.len(),
            path_variations_count: path_variations.len(),
            extra_count: extra.len(),
        },
        missing,
        path_variations,
        extra,
    }
}
