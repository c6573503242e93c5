//! Set-algebra diff between two spec snapshots.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::index::OperationRecord;

/// Operation keys added and removed between two versions of the spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDiff {
    /// The version the diff starts from.
    pub from: String,
    /// The version the diff ends at.
    pub to: String,
    /// Keys present in `to` but not `from`, sorted.
    pub added: Vec<String>,
    /// Keys present in `from` but not `to`, sorted.
    pub removed: Vec<String>,
}

/// Compute `added = keys(to) - keys(from)` and `removed = keys(from) -
/// keys(to)` over two flat operation indexes.
///
/// Pure set algebra; both outputs come back sorted because the indexes are
/// ordered maps.
#[must_use]
pub fn diff_operation_keys(
    from_version: &str,
    to_version: &str,
    from: &BTreeMap<String, OperationRecord>,
    to: &BTreeMap<String, OperationRecord>,
) -> VersionDiff {
    let added = to
        .keys()
        .filter(|k| !from.contains_key(*k))
        .cloned()
        .collect();
    let removed = from
        .keys()
        .filter(|k| !to.contains_key(*k))
        .cloned()
        .collect();

    VersionDiff {
        from: from_version.to_owned(),
        to: to_version.to_owned(),
        added,
        removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{index_operations, IndexFilter};
    use serde_json::json;

    fn index_of(spec: serde_json::Value) -> BTreeMap<String, OperationRecord> {
        index_operations(&spec, &IndexFilter::everything())
    }

    #[test]
    fn reports_added_and_removed_keys() {
        let old = index_of(json!({
            "paths": { "/a": { "get": {} }, "/b": { "get": {} } }
        }));
        let new = index_of(json!({
            "paths": { "/b": { "get": {} }, "/c": { "post": {} } }
        }));

        let diff = diff_operation_keys("1.0", "2.0", &old, &new);
        assert_eq!(diff.added, ["POST /c"]);
        assert_eq!(diff.removed, ["GET /a"]);
        assert_eq!(diff.from, "1.0");
        assert_eq!(diff.to, "2.0");
    }

    #[test]
    fn identical_indexes_diff_empty() {
        let spec = json!({ "paths": { "/a": { "get": {} } } });
        let diff = diff_operation_keys("1", "2", &index_of(spec.clone()), &index_of(spec));
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn diff_is_symmetric() {
        let a = index_of(json!({
            "paths": { "/a": { "get": {} }, "/b": { "post": {} } }
        }));
        let b = index_of(json!({
            "paths": { "/b": { "post": {} }, "/c": { "get": {}, "delete": {} } }
        }));

        let forward = diff_operation_keys("a", "b", &a, &b);
        let backward = diff_operation_keys("b", "a", &b, &a);

        assert_eq!(forward.added, backward.removed);
        assert_eq!(forward.removed, backward.added);
    }

    #[test]
    fn outputs_are_sorted() {
        let old = index_of(json!({ "paths": {} }));
        let new = index_of(json!({
            "paths": { "/z": { "get": {} }, "/a": { "get": {} }, "/m": { "post": {} } }
        }));

        let diff = diff_operation_keys("0", "1", &old, &new);
        assert_eq!(diff.added, ["GET /a", "GET /z", "POST /m"]);
    }
}
