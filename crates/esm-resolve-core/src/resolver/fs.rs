//! Filesystem capability used by the resolver.
//!
//! Every read goes through [`FileSystem`] so the engine can run against the
//! real disk or an in-memory fixture. Implementations must not cache between
//! calls: the filesystem is authoritative.

use super::builtins;
use super::manifest::Manifest;
use crate::error::Result;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only filesystem operations the resolver needs.
pub trait FileSystem: Send + Sync {
    /// Whether `path` is an existing regular file (following symlinks).
    fn is_file(&self, path: &Path) -> bool;

    /// Whether `path` is an existing directory (following symlinks).
    fn is_dir(&self, path: &Path) -> bool;

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    /// Canonicalize `path`, resolving every symlink.
    fn realpath(&self, path: &Path) -> io::Result<PathBuf>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Expand a `prefix*suffix` target under `dir`.
    ///
    /// Returns `(middle, file)` pairs. Directories are never returned.
    fn star_glob(&self, prefix: &str, suffix: &str, dir: &Path) -> Vec<(String, PathBuf)>;

    /// Read and shape-check a manifest.
    ///
    /// Missing or unparseable files, and documents that are not manifests,
    /// yield `Ok(None)`. Malformed `exports`/`imports` maps are errors.
    fn read_manifest(&self, path: &Path) -> Result<Option<Manifest>> {
        match self.read_to_string(path) {
            Ok(source) => Manifest::parse(&source),
            Err(_) => Ok(None),
        }
    }

    fn is_builtin(&self, name: &str) -> bool {
        builtins::is_builtin(name)
    }
}

/// [`FileSystem`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
        dunce::canonicalize(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        esm_resolve_util::fs::read_to_string_lossy(path)
    }

    fn star_glob(&self, prefix: &str, suffix: &str, dir: &Path) -> Vec<(String, PathBuf)> {
        match esm_resolve_util::star::star_glob(prefix, suffix, dir) {
            Ok(matches) => matches,
            Err(e) => {
                debug!(prefix, suffix, error = %e, "Invalid wildcard pattern, no matches");
                Vec::new()
            }
        }
    }
}
