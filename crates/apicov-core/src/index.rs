//! Flattening an OpenAPI document into an operation index.
//!
//! The document arrives as parsed JSON (`paths` → methods → operation
//! objects). The indexer walks it and produces a flat, sorted map of
//! operation key → [`OperationRecord`], the shape the reconciler, differ
//! and query facade all consume.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::normalize::normalize_path;

/// HTTP methods the indexer recognizes as operation entries within a path
/// item. Anything else (`parameters`, `description`, vendor extensions,
/// exotic verbs) is silently skipped.
pub const RECOGNIZED_METHODS: [&str; 7] =
    ["get", "post", "put", "delete", "patch", "head", "options"];

/// Build the canonical operation key: `"<METHOD> <PATH>"`, method
/// uppercased, path verbatim.
#[must_use]
pub fn operation_key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_uppercase(), path)
}

/// A single API operation, flattened out of the spec document.
///
/// Built fresh from the current document on every call; never cached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    /// Operation key, `"<METHOD> <PATH>"`.
    pub key: String,
    /// HTTP method, uppercased.
    pub method: String,
    /// Path template exactly as it appears in the document.
    pub path: String,
    /// Path with every placeholder collapsed to `{param}`.
    pub normalized_path: String,
    /// Operation summary, if present.
    pub summary: Option<String>,
    /// Operation description, if present.
    pub description: Option<String>,
    /// Tags in source order.
    pub tags: Vec<String>,
    /// Whether the operation is marked deprecated.
    pub deprecated: bool,
    /// Raw parameter objects from the document.
    pub parameters: Vec<Value>,
    /// Raw request body object, if any.
    pub request_body: Option<Value>,
    /// Response status codes, sorted.
    pub response_codes: Vec<String>,
}

impl OperationRecord {
    /// Flatten one operation object from the document.
    ///
    /// `method` is the lowercase key under the path item; `op` is the
    /// operation object itself. Missing or mistyped fields degrade to
    /// empty defaults rather than failing - the core does not validate
    /// spec conformity.
    #[must_use]
    pub fn from_operation(method: &str, path: &str, op: &Value) -> Self {
        let tags = op
            .get("tags")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let mut response_codes: Vec<String> = op
            .get("responses")
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        response_codes.sort();

        Self {
            key: operation_key(method, path),
            method: method.to_uppercase(),
            path: path.to_owned(),
            normalized_path: normalize_path(path),
            summary: string_field(op, "summary"),
            description: string_field(op, "description"),
            tags,
            deprecated: op
                .get("deprecated")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            parameters: op
                .get("parameters")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            request_body: op.get("requestBody").filter(|v| !v.is_null()).cloned(),
            response_codes,
        }
    }

    /// The record's key after path normalization, `"<METHOD> <normalized>"`.
    #[must_use]
    pub fn normalized_key(&self) -> String {
        format!("{} {}", self.method, self.normalized_path)
    }
}

fn string_field(op: &Value, name: &str) -> Option<String> {
    op.get(name).and_then(Value::as_str).map(str::to_owned)
}

/// Filters applied while indexing.
#[derive(Debug, Clone, Default)]
pub struct IndexFilter {
    /// Include operations marked deprecated. When false they are excluded
    /// from the index entirely, not just flagged.
    pub include_deprecated: bool,
    /// Keep only operations whose tag list contains this tag. Used by the
    /// listing query, never by reconciliation.
    pub tag: Option<String>,
}

impl IndexFilter {
    /// Filter that keeps everything, including deprecated operations.
    #[must_use]
    pub const fn everything() -> Self {
        Self {
            include_deprecated: true,
            tag: None,
        }
    }
}

/// Flatten a spec document into a sorted operation index.
///
/// Walks every path entry and every recognized method within it. A document
/// without a `paths` object yields an empty index. `BTreeMap` ordering gives
/// deterministic, lexicographically sorted iteration downstream.
#[must_use]
pub fn index_operations(spec: &Value, filter: &IndexFilter) -> BTreeMap<String, OperationRecord> {
    let mut index = BTreeMap::new();

    let Some(paths) = spec.get("paths").and_then(Value::as_object) else {
        return index;
    };

    for (path, item) in paths {
        for method in RECOGNIZED_METHODS {
            let Some(op) = item.get(method) else {
                continue;
            };
            let record = OperationRecord::from_operation(method, path, op);
            if !filter.include_deprecated && record.deprecated {
                continue;
            }
            if let Some(tag) = &filter.tag {
                if !record.tags.contains(tag) {
                    continue;
                }
            }
            index.insert(record.key.clone(), record);
        }
    }

    index
}
