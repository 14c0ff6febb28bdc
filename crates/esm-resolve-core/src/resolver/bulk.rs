//! Whole-manifest resolution: every export, every local import.
//!
//! Each operation is split in two halves so the blocking and async front
//! ends share one algorithm: a planning pass that reads the manifest and
//! lists the entries, and a per-entry expansion that can run anywhere.
//! Entries that fail to resolve are left out of the result.

use super::conditions::resolve_conditional_value;
use super::engine::Resolver;
use super::exports::resolve_export;
use super::fs::FileSystem;
use super::manifest::{ExportsTree, ImportsTree, MANIFEST_FILE};
use super::pattern::split_star;
use super::specifier::parse_package_specifier;
use super::target::ResolvedTarget;
use super::walker::find_dependency_root;
use crate::config::ResolveOptions;
use crate::error::{Error, Result};
use esm_resolve_util::fs::normalize_path;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Subpath (or import key) to resolved target.
pub type ResolutionMap = BTreeMap<String, ResolvedTarget>;

/// The package a bulk operation runs against.
#[derive(Debug, Clone)]
pub struct PackageContext {
    pub manifest_path: PathBuf,
    pub dir: PathBuf,
    pub name: Option<String>,
}

/// One entry to expand: a map key and its condition-resolved target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkEntry {
    pub key: String,
    pub target: String,
}

impl<F: FileSystem> Resolver<F> {
    /// Map every export subpath of the manifest at `manifest_path` to the
    /// file it resolves to.
    ///
    /// Wildcard subpaths whose target also has a single `*` are expanded
    /// against the files in the package. Targets are not checked for
    /// existence otherwise.
    ///
    /// # Errors
    /// `InvalidManifest` if the manifest cannot be read or has an invalid
    /// shape.
    pub fn resolve_all_exports(
        &self,
        manifest_path: &Path,
        options: &ResolveOptions,
    ) -> Result<ResolutionMap> {
        let (package, entries) = self.plan_exports(manifest_path, options)?;
        Ok(entries
            .iter()
            .flat_map(|entry| self.expand_export(&package, entry))
            .collect())
    }

    /// Map every local `imports` key of the manifest at `manifest_path` to
    /// the file it resolves to.
    ///
    /// Targets pointing back into `#` imports are skipped. Wildcard targets
    /// are expanded against local files, or against the exports of the
    /// package they name.
    ///
    /// # Errors
    /// `InvalidManifest` if the manifest cannot be read or has an invalid
    /// shape.
    pub fn resolve_all_local_imports(
        &self,
        manifest_path: &Path,
        options: &ResolveOptions,
    ) -> Result<ResolutionMap> {
        let (package, entries) = self.plan_imports(manifest_path, options)?;
        Ok(entries
            .iter()
            .flat_map(|entry| self.expand_import(&package, entry, options))
            .collect())
    }

    /// Read the manifest and list each export subpath with its target.
    pub fn plan_exports(
        &self,
        manifest_path: &Path,
        options: &ResolveOptions,
    ) -> Result<(PackageContext, Vec<BulkEntry>)> {
        let (package, exports, _) = self.read_package(manifest_path)?;
        let Some(exports) = exports else {
            return Ok((package, Vec::new()));
        };

        let active = options.active_conditions();
        let from = manifest_path.display().to_string();
        let entries = exports
            .subpaths()
            .into_iter()
            .filter_map(|subpath| {
                match resolve_export(subpath, &exports, manifest_path, &from, &active) {
                    Ok(target) => Some(BulkEntry {
                        key: subpath.to_string(),
                        target,
                    }),
                    Err(e) => {
                        trace!(subpath, error = %e, "Export omitted");
                        None
                    }
                }
            })
            .collect();
        Ok((package, entries))
    }

    /// Expand one export entry, globbing when both sides carry a `*`.
    pub fn expand_export(&self, package: &PackageContext, entry: &BulkEntry) -> ResolutionMap {
        let mut out = ResolutionMap::new();
        if let (Some((key_prefix, key_suffix)), Some((prefix, suffix))) =
            (split_star(&entry.key), split_star(&entry.target))
        {
            for (middle, file) in self.fs().star_glob(prefix, suffix, &package.dir) {
                if let Ok(url) = self.file_url(&file) {
                    out.insert(
                        format!("{key_prefix}{middle}{key_suffix}"),
                        ResolvedTarget::File(url),
                    );
                }
            }
            return out;
        }

        let file = normalize_path(&package.dir.join(&entry.target));
        match self.file_url(&file) {
            Ok(url) => {
                out.insert(entry.key.clone(), ResolvedTarget::File(url));
            }
            Err(e) => trace!(key = %entry.key, error = %e, "Export omitted"),
        }
        out
    }

    /// Read the manifest and list each import key with its target.
    ///
    /// Keys whose target is `null` or another `#` specifier are dropped.
    pub fn plan_imports(
        &self,
        manifest_path: &Path,
        options: &ResolveOptions,
    ) -> Result<(PackageContext, Vec<BulkEntry>)> {
        let (package, _, imports) = self.read_package(manifest_path)?;
        let active = options.active_conditions();
        let entries = imports
            .iter()
            .flat_map(|imports| imports.entries())
            .filter_map(|(key, value)| {
                let target = resolve_conditional_value(value, &active)?;
                (!target.starts_with('#')).then(|| BulkEntry {
                    key: key.clone(),
                    target: target.to_string(),
                })
            })
            .collect();
        Ok((package, entries))
    }

    /// Expand one import entry.
    pub fn expand_import(
        &self,
        package: &PackageContext,
        entry: &BulkEntry,
        options: &ResolveOptions,
    ) -> ResolutionMap {
        let mut out = ResolutionMap::new();
        let referrer = package.manifest_path.display().to_string();
        let Some((name, _)) = parse_package_specifier(&entry.target) else {
            return out;
        };

        let (Some((key_prefix, key_suffix)), Some((prefix, suffix))) =
            (split_star(&entry.key), split_star(&entry.target))
        else {
            match self.resolve(&entry.target, Some(&referrer), options) {
                Ok(target) => {
                    out.insert(entry.key.clone(), target);
                }
                Err(e) => trace!(key = %entry.key, error = %e, "Import omitted"),
            }
            return out;
        };

        if name == "." {
            for (middle, file) in self.fs().star_glob(prefix, suffix, &package.dir) {
                if let Ok(url) = self.file_url(&file) {
                    out.insert(
                        format!("{key_prefix}{middle}{key_suffix}"),
                        ResolvedTarget::File(url),
                    );
                }
            }
            return out;
        }

        let root = if package.name.as_deref() == Some(name) {
            Some(package.dir.clone())
        } else {
            find_dependency_root(self.fs(), Some(name), &package.manifest_path)
        };
        let Some(root) = root else {
            trace!(key = %entry.key, package = name, "Import package not found");
            return out;
        };
        let dep_manifest = root.join(MANIFEST_FILE);
        if !self.fs().is_file(&dep_manifest) {
            return out;
        }
        let Ok(exports) = self.resolve_all_exports(&dep_manifest, options) else {
            return out;
        };

        for (subpath, target) in exports {
            if subpath == "." || subpath == "./" {
                continue;
            }
            let import = format!("{name}{}", &subpath[1..]);
            if import.len() < prefix.len() + suffix.len()
                || !import.starts_with(prefix)
                || !import.ends_with(suffix)
            {
                continue;
            }
            let middle = &import[prefix.len()..import.len() - suffix.len()];
            if let Ok(resolved) = self.resolve(&target.to_string(), Some(&referrer), options) {
                out.insert(format!("{key_prefix}{middle}{key_suffix}"), resolved);
            }
        }
        out
    }

    fn read_package(
        &self,
        manifest_path: &Path,
    ) -> Result<(PackageContext, Option<ExportsTree>, Option<ImportsTree>)> {
        let manifest = self
            .fs()
            .read_manifest(manifest_path)?
            .ok_or_else(|| Error::InvalidManifest {
                path: manifest_path.to_path_buf(),
            })?;
        let dir = manifest_path
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);
        let package = PackageContext {
            manifest_path: manifest_path.to_path_buf(),
            dir,
            name: manifest.name,
        };
        Ok((package, manifest.exports, manifest.imports))
    }
}

/// Resolve every export with the default real-filesystem resolver.
pub fn resolve_all_exports_sync(
    manifest_path: &Path,
    options: &ResolveOptions,
) -> Result<ResolutionMap> {
    Resolver::new().resolve_all_exports(manifest_path, options)
}

/// Resolve every local import with the default real-filesystem resolver.
pub fn resolve_all_local_imports_sync(
    manifest_path: &Path,
    options: &ResolveOptions,
) -> Result<ResolutionMap> {
    Resolver::new().resolve_all_local_imports(manifest_path, options)
}
