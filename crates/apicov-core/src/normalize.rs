//! Canonical form for path templates.
//!
//! OpenAPI documents and client registries frequently disagree on parameter
//! names (`{tournamentId}` vs `{broadcastTournamentId}`). Collapsing every
//! placeholder to a single token lets two templates that differ only in
//! parameter naming compare equal.

use once_cell::sync::Lazy;
use regex::Regex;

/// The token every placeholder collapses to.
pub const PLACEHOLDER: &str = "{param}";

static PARAM_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^}]+\}").expect("placeholder pattern is valid"));

/// Replace every `{name}` placeholder in `path` with [`PLACEHOLDER`].
///
/// Non-placeholder text is preserved verbatim, including leading and
/// trailing slashes and case. A path with no placeholders is returned
/// unchanged. The transformation is idempotent.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    PARAM_PATTERN.replace_all(path, PLACEHOLDER).into_owned()
}
