//! Wildcard expansion for `exports`/`imports` targets.
//!
//! In a manifest target a single `*` stands for any run of characters,
//! path separators included. Expansion walks the package directory and
//! tests every file against the equivalent recursive glob.

use crate::fs::to_slash;
use glob::{MatchOptions, Pattern, PatternError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Build the recursive glob for a `prefix*suffix` target.
///
/// `./dist/*.js` becomes `./dist/**/*.js`, `./lib/*/index.js` becomes
/// `./lib/**/index.js`.
#[must_use]
pub fn star_pattern(prefix: &str, suffix: &str) -> String {
    let mut pattern = Pattern::escape(prefix);
    if !prefix.ends_with('/') {
        pattern.push_str("*/");
    }
    pattern.push_str("**");
    if !suffix.starts_with('/') {
        pattern.push_str("/*");
    }
    pattern.push_str(&Pattern::escape(suffix));
    pattern
}

/// Expand a `prefix*suffix` target against the files under `dir`.
///
/// Returns `(middle, path)` pairs where `middle` is the text the `*` stood
/// for and `path` is the matched file under `dir`. Directories are never
/// returned. Results are ordered by file name, depth first.
///
/// # Errors
/// Returns an error if the derived glob pattern is invalid.
pub fn star_glob(
    prefix: &str,
    suffix: &str,
    dir: &Path,
) -> Result<Vec<(String, PathBuf)>, PatternError> {
    let pattern = Pattern::new(&star_pattern(prefix, suffix))?;
    let dot_relative = prefix.starts_with("./");
    let mut matches = Vec::new();

    // follow_links reports loops as errors, which are skipped
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(dir) else {
            continue;
        };

        let mut candidate = to_slash(rel);
        if dot_relative {
            candidate.insert_str(0, "./");
        }

        if candidate.len() < prefix.len() + suffix.len()
            || !pattern.matches_with(&candidate, MATCH_OPTIONS)
        {
            continue;
        }

        let middle = candidate[prefix.len()..candidate.len() - suffix.len()].to_string();
        matches.push((middle, entry.path().to_path_buf()));
    }

    Ok(matches)
}
