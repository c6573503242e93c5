//! Read-only lookups over a single spec document.
//!
//! Independent of reconciliation: fetch one operation's full metadata by
//! method and path, or list operations with optional tag and deprecated
//! filters. Unknown paths and methods are ordinary answers here, not
//! errors.

use serde::Serialize;
use serde_json::Value;

use crate::index::{index_operations, IndexFilter, OperationRecord};

/// Outcome of a single-operation lookup.
#[derive(Debug)]
pub enum OperationLookup {
    /// The operation exists; full metadata attached.
    Found(Box<OperationRecord>),
    /// The document has no entry for the requested path.
    PathNotFound {
        /// The path that was requested.
        path: String,
    },
    /// The path exists but not with the requested method.
    MethodNotFound {
        /// The method that was requested, uppercased.
        method: String,
        /// The path that was requested.
        path: String,
    },
}

impl OperationLookup {
    /// Human-readable miss description, `None` when the operation was found.
    #[must_use]
    pub fn miss_message(&self) -> Option<String> {
        match self {
            Self::Found(_) => None,
            Self::PathNotFound { path } => Some(format!("Path not found: {path}")),
            Self::MethodNotFound { method, path } => {
                Some(format!("Method not found: {method} {path}"))
            }
        }
    }
}

/// Look up a single operation by HTTP method and path.
///
/// Methods are matched case-insensitively against the document's lowercase
/// keys; the path must match exactly.
#[must_use]
pub fn get_operation(spec: &Value, method: &str, path: &str) -> OperationLookup {
    let Some(path_item) = spec.get("paths").and_then(|p| p.get(path)) else {
        return OperationLookup::PathNotFound {
            path: path.to_owned(),
        };
    };

    let method_lower = method.to_lowercase();
    let Some(op) = path_item.get(&method_lower) else {
        return OperationLookup::MethodNotFound {
            method: method.to_uppercase(),
            path: path.to_owned(),
        };
    };

    OperationLookup::Found(Box::new(OperationRecord::from_operation(
        &method_lower,
        path,
        op,
    )))
}

/// One row of a listing result.
#[derive(Debug, Clone, Serialize)]
pub struct OperationSummary {
    /// Operation key.
    pub key: String,
    /// Operation summary, if any.
    pub summary: Option<String>,
    /// Operation tags.
    pub tags: Vec<String>,
    /// Whether the operation is marked deprecated.
    pub deprecated: bool,
}

/// A listing of operations, sorted by key.
#[derive(Debug, Clone, Serialize)]
pub struct OperationList {
    /// Number of operations in the listing.
    pub count: usize,
    /// The operations themselves.
    pub operations: Vec<OperationSummary>,
}

/// List operations in the document, optionally filtered by tag and
/// deprecated inclusion, sorted by operation key.
#[must_use]
pub fn list_operations(spec: &Value, filter: &IndexFilter) -> OperationList {
    let operations: Vec<OperationSummary> = index_operations(spec, filter)
        .into_values()
        .map(|op| OperationSummary {
            key: op.key,
            summary: op.summary,
            tags: op.tags,
            deprecated: op.deprecated,
        })
        .collect();

    OperationList {
        count: operations.len(),
        operations,
    }
}
