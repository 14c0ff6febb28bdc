//! Ancestor walks that locate governing manifests and dependency roots.

use super::fs::FileSystem;
use super::manifest::{Manifest, MANIFEST_FILE};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The nearest valid manifest above a path.
#[derive(Debug, Clone)]
pub struct PackageScope {
    /// Directory holding the manifest.
    pub dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
}

impl PackageScope {
    /// Whether a bare specifier naming `name` refers to this package itself.
    ///
    /// Only packages that declare both `name` and `exports` can be
    /// imported by name from inside.
    #[must_use]
    pub fn is_self_reference(&self, name: &str) -> bool {
        self.manifest.exports.is_some() && self.manifest.name.as_deref() == Some(name)
    }
}

/// Find the nearest `node_modules/<name>` directory above `parent`.
///
/// The walk starts at `parent`'s directory. With `name` of `None` or `""`
/// the bare `node_modules` directory is looked up instead. The result is
/// canonicalized so symlinked packages resolve to one stable location.
pub fn find_dependency_root<F: FileSystem + ?Sized>(
    fs: &F,
    name: Option<&str>,
    parent: &Path,
) -> Option<PathBuf> {
    let start = parent.parent()?;
    for dir in start.ancestors() {
        let node_modules = dir.join("node_modules");
        let candidate = match name {
            Some(name) if !name.is_empty() => node_modules.join(name),
            _ => node_modules,
        };
        if !fs.is_dir(&candidate) {
            continue;
        }
        match fs.realpath(&candidate) {
            Ok(root) => {
                debug!(path = %root.display(), "Found dependency root");
                return Some(root);
            }
            Err(e) => {
                debug!(path = %candidate.display(), error = %e, "Failed to canonicalize dependency root");
            }
        }
    }
    None
}

/// Find the nearest manifest above `parent`.
///
/// Unreadable files and documents that are not manifests are skipped. A
/// manifest with malformed `exports`/`imports` still governs its directory,
/// so its error is returned rather than walking past it.
pub fn nearest_package_scope<F: FileSystem + ?Sized>(
    fs: &F,
    parent: &Path,
) -> Result<Option<PackageScope>> {
    let Some(start) = parent.parent() else {
        return Ok(None);
    };
    for dir in start.ancestors() {
        let manifest_path = dir.join(MANIFEST_FILE);
        if let Some(manifest) = fs.read_manifest(&manifest_path)? {
            return Ok(Some(PackageScope {
                dir: dir.to_path_buf(),
                manifest_path,
                manifest,
            }));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::super::fs::RealFileSystem;
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_dependency_root_walks_up() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::create_dir_all(root.join("src/deep")).unwrap();

        let found =
            find_dependency_root(&RealFileSystem, Some("dep"), &root.join("src/deep/a.js")).unwrap();
        assert_eq!(found, dunce::canonicalize(root.join("node_modules/dep")).unwrap());
    }

    #[test]
    fn test_find_dependency_root_prefers_nearest() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::create_dir_all(root.join("pkg/node_modules/dep")).unwrap();

        let found =
            find_dependency_root(&RealFileSystem, Some("dep"), &root.join("pkg/index.js")).unwrap();
        assert_eq!(
            found,
            dunce::canonicalize(root.join("pkg/node_modules/dep")).unwrap()
        );
    }

    #[test]
    fn test_find_dependency_root_bare_node_modules() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("node_modules")).unwrap();

        let found = find_dependency_root(&RealFileSystem, None, &root.join("a.js")).unwrap();
        assert_eq!(found, dunce::canonicalize(root.join("node_modules")).unwrap());
        let found = find_dependency_root(&RealFileSystem, Some(""), &root.join("a.js")).unwrap();
        assert_eq!(found, dunce::canonicalize(root.join("node_modules")).unwrap());
    }

    #[test]
    fn test_find_dependency_root_ignores_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join("node_modules/dep"), "").unwrap();

        assert!(find_dependency_root(&RealFileSystem, Some("missing-dep-xyz"), &root.join("a.js")).is_none());
        assert!(find_dependency_root(&RealFileSystem, Some("dep"), &root.join("a.js")).is_none());
    }

    #[test]
    fn test_nearest_package_scope_skips_invalid() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("package.json"),
            r#"{"name": "outer", "exports": "./index.js"}"#,
        )
        .unwrap();
        fs::create_dir_all(root.join("inner")).unwrap();
        fs::write(root.join("inner/package.json"), r#"{"name": 42}"#).unwrap();

        let scope = nearest_package_scope(&RealFileSystem, &root.join("inner/a.js"))
            .unwrap()
            .unwrap();
        assert_eq!(scope.dir, root);
        assert!(scope.is_self_reference("outer"));
        assert!(!scope.is_self_reference("other"));
    }

    #[test]
    fn test_nearest_package_scope_stops_at_malformed_maps() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("package.json"), r##"{"imports": {"#x": "./x.js"}}"##).unwrap();
        fs::create_dir_all(root.join("inner")).unwrap();
        fs::write(
            root.join("inner/package.json"),
            r#"{"exports": {"./a": {"import": 5}}}"#,
        )
        .unwrap();

        let err = nearest_package_scope(&RealFileSystem, &root.join("inner/a.js")).unwrap_err();
        assert!(err.is_structural());
    }
}
