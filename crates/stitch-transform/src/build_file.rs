//! Build-descriptor path rewrite.
//!
//! The instrumented tree is compiled from a nested `processed/` directory,
//! so relative `path = "..."` dependency entries in the build manifest point
//! one level too high. This is a purely textual pass — no AST, no TOML
//! parser — that prefixes one more `../` onto every relative upward path
//! dependency.

use once_cell::sync::Lazy;
use regex::Regex;

// `path = "../something"` with arbitrary spacing.
#[allow(clippy::unwrap_used)]
static PATH_DEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"path\s*=\s*"(\.\./[^"]*)""#).unwrap());

/// Rewrite manifest text for compilation out of a nested directory.
/// Returns the rewritten text and the number of rewritten entries.
#[must_use]
pub fn rewrite_build_file(source: &str) -> (String, usize) {
    let mut count = 0;
    let rewritten = PATH_DEP
        .replace_all(source, |caps: &regex::Captures<'_>| {
            count += 1;
            format!("path = \"../{}\"", &caps[1])
        })
        .into_owned();
    (rewritten, count)
}
