//! Package.json exports field evaluation.
//!
//! Follows the host loader's rules:
//! - Root exports (string, array, or condition map for `.`)
//! - Subpath exports (`./feature`)
//! - Pattern exports with a single `*` wildcard, most specific key first
//! - Conditional targets, resolved in declaration order

use super::conditions::{resolve_condition_entries, resolve_conditional_value};
use super::manifest::ExportsTree;
use super::pattern::find_star_match;
use crate::config::ActiveConditions;
use crate::error::{Error, Result};
use std::path::Path;

/// Normalize a requested subpath to the form used as an exports key.
///
/// `""` and `"."` become `"."`, `./x` is kept, anything else gets `./`.
#[must_use]
pub fn normalize_subpath(sub: &str) -> String {
    match sub {
        "" | "." => ".".to_string(),
        s if s.starts_with("./") => s.to_string(),
        s => format!("./{s}"),
    }
}

/// Resolve `sub` against a package's exports.
///
/// Returns the target as written in the manifest (usually `./…`), with any
/// `*` replaced by the text the matched pattern captured.
///
/// # Errors
/// `SubpathNotExported` when no key matches or the matching key resolves to
/// `null` under the active conditions.
pub fn resolve_export(
    sub: &str,
    exports: &ExportsTree,
    manifest: &Path,
    from: &str,
    active: &ActiveConditions,
) -> Result<String> {
    let subpath = normalize_subpath(sub);
    let not_exported = || Error::SubpathNotExported {
        subpath: subpath.clone(),
        manifest: manifest.to_path_buf(),
        from: from.to_string(),
    };

    let entries = match exports {
        ExportsTree::Root(value) => {
            return (subpath == ".")
                .then(|| resolve_conditional_value(value, active))
                .flatten()
                .map(str::to_string)
                .ok_or_else(not_exported);
        }
        ExportsTree::Subpaths(entries) => entries,
    };

    // the whole map is tried as a condition map first
    if subpath == "." {
        if let Some(target) = resolve_condition_entries(entries, active) {
            return Ok(target.to_string());
        }
    }

    if let Some(value) = exports.get(&subpath) {
        return resolve_conditional_value(value, active)
            .map(str::to_string)
            .ok_or_else(not_exported);
    }

    let keys = entries.iter().map(|(k, _)| k.as_str());
    if let Some((key, middle)) = find_star_match(&subpath, keys) {
        let target = exports
            .get(key)
            .and_then(|value| resolve_conditional_value(value, active))
            .ok_or_else(not_exported)?;
        return Ok(target.replace('*', middle));
    }

    Err(not_exported())
}
