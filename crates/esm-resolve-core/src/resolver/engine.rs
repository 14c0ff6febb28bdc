//! The resolution engine.
//!
//! One call to [`Resolver::resolve`] drives a small state machine. Each
//! [`Step`] either finishes with a target or hands over to the next step:
//!
//! | step | input | next |
//! |------|-------|------|
//! | `Specifier` | any specifier + referrer | done (file URL, relative, absolute, builtin) or `Package` |
//! | `Package` | bare or `#` specifier | done (self-reference), `Specifier` (imports target), `Dependency` |
//! | `Dependency` | package name + subpath | done |

use super::conditions::resolve_conditional_value;
use super::exports::resolve_export;
use super::fs::{FileSystem, RealFileSystem};
use super::manifest::{ConditionalValue, ImportsTree, MANIFEST_FILE};
use super::pattern::find_star_match;
use super::specifier::{is_relative_specifier, parse_package_specifier, FILE_URL_PREFIX};
use super::target::ResolvedTarget;
use super::walker::{find_dependency_root, nearest_package_scope, PackageScope};
use crate::config::{ActiveConditions, ResolveOptions};
use crate::error::{Error, Result};
use esm_resolve_util::fs::normalize_path;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// File tried when a package has no usable entry point.
const INDEX_FILE: &str = "index.js";

/// Resolves import specifiers the way the host module loader does.
#[derive(Debug, Clone, Default)]
pub struct Resolver<F = RealFileSystem> {
    fs: F,
}

impl Resolver<RealFileSystem> {
    /// A resolver over the real filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
enum Step {
    Specifier {
        specifier: String,
        referrer: Option<String>,
    },
    Package {
        specifier: String,
        parent: PathBuf,
    },
    Dependency {
        name: Option<String>,
        subpath: String,
        parent: PathBuf,
    },
}

enum Transition {
    Done(ResolvedTarget),
    Next(Step),
}

/// Per-call state threaded through every step.
struct Context<'a> {
    options: &'a ResolveOptions,
    active: ActiveConditions,
    original_parent: Option<String>,
}

impl Context<'_> {
    fn original_parent(&self) -> &str {
        self.original_parent.as_deref().unwrap_or_default()
    }
}

impl<F: FileSystem> Resolver<F> {
    /// A resolver over a custom filesystem.
    pub fn with_fs(fs: F) -> Self {
        Self { fs }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Resolve `specifier` as if imported from `referrer`.
    ///
    /// `referrer` may be a path or a `file://` URL. Without one, relative
    /// specifiers fail and bare specifiers are looked up from the base
    /// directory in `options`.
    pub fn resolve(
        &self,
        specifier: &str,
        referrer: Option<&str>,
        options: &ResolveOptions,
    ) -> Result<ResolvedTarget> {
        if specifier.is_empty() {
            return Err(Error::InvalidSpecifier {
                specifier: String::new(),
            });
        }

        let mut cx = Context {
            options,
            active: options.active_conditions(),
            original_parent: options.original_parent.clone(),
        };
        let mut step = Step::Specifier {
            specifier: specifier.to_string(),
            referrer: referrer.map(str::to_string),
        };

        let mut depth = 0usize;
        loop {
            debug!(depth, step = ?step, "Resolution step");
            let transition = match step {
                Step::Specifier {
                    specifier,
                    referrer,
                } => self.specifier_step(&mut cx, &specifier, referrer.as_deref())?,
                Step::Package { specifier, parent } => {
                    self.package_step(&cx, &specifier, &parent)?
                }
                Step::Dependency {
                    name,
                    subpath,
                    parent,
                } => Transition::Done(self.dependency_step(&cx, name.as_deref(), &subpath, &parent)?),
            };
            match transition {
                Transition::Done(target) => {
                    debug!(%target, "Resolved");
                    return Ok(target);
                }
                Transition::Next(next) => step = next,
            }
            depth += 1;
        }
    }

    /// Classify a specifier and resolve the cases that need no manifest.
    fn specifier_step(
        &self,
        cx: &mut Context<'_>,
        specifier: &str,
        referrer: Option<&str>,
    ) -> Result<Transition> {
        let from = || {
            referrer.map_or_else(
                || cx.options.base_dir().display().to_string(),
                str::to_string,
            )
        };

        if specifier.starts_with(FILE_URL_PREFIX) {
            let path = Url::parse(specifier)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| Error::InvalidSpecifier {
                    specifier: specifier.to_string(),
                })?;
            if !self.fs.is_file(&path) {
                return Err(Error::ModuleNotFound {
                    module: specifier.to_string(),
                    from: from(),
                });
            }
            return self.file_target(&path).map(Transition::Done);
        }

        let parent = referrer.map(|r| self.referrer_path(r, cx.options)).transpose()?;

        if is_relative_specifier(specifier) {
            let Some(parent) = parent else {
                return Err(Error::RelativeImportWithoutReferrer {
                    specifier: specifier.to_string(),
                });
            };
            let dir = self.canonical_parent_dir(&parent);
            let path = normalize_path(&dir.join(specifier));
            if !self.fs.is_file(&path) {
                return Err(Error::ModuleNotFound {
                    module: specifier.to_string(),
                    from: from(),
                });
            }
            debug!(path = %path.display(), "Relative specifier");
            return self.file_target(&path).map(Transition::Done);
        }

        if Path::new(specifier).is_absolute() {
            let path = normalize_path(Path::new(specifier));
            if !self.fs.is_file(&path) {
                return Err(Error::ModuleNotFound {
                    module: specifier.to_string(),
                    from: from(),
                });
            }
            return self.file_target(&path).map(Transition::Done);
        }

        if self.fs.is_builtin(specifier) {
            debug!(specifier, "Builtin module");
            return Ok(Transition::Done(ResolvedTarget::Builtin(specifier.to_string())));
        }

        // bare or `#` specifier, resolved relative to a parent path
        let parent = match parent {
            Some(parent) => parent,
            None => self.canonical_parent_dir(&cx.options.base_dir().join("x")).join("x"),
        };
        if cx.original_parent.is_none() {
            cx.original_parent = Some(parent.display().to_string());
        }
        Ok(Transition::Next(Step::Package {
            specifier: specifier.to_string(),
            parent,
        }))
    }

    /// Resolve through the nearest manifest: self-reference or `imports`.
    fn package_step(&self, cx: &Context<'_>, specifier: &str, parent: &Path) -> Result<Transition> {
        let (name, subpath) =
            parse_package_specifier(specifier).ok_or_else(|| Error::InvalidSpecifier {
                specifier: specifier.to_string(),
            })?;

        if let Some(scope) = nearest_package_scope(&self.fs, parent)? {
            if scope.is_self_reference(name) {
                debug!(name, manifest = %scope.manifest_path.display(), "Self-reference");
                return self
                    .exported_file(cx, &scope, subpath)
                    .map(Transition::Done);
            }
            if specifier.starts_with('#') {
                return self.imports_step(cx, &scope, specifier, parent);
            }
        }

        Ok(Transition::Next(Step::Dependency {
            name: Some(name.to_string()),
            subpath: subpath.to_string(),
            parent: parent.to_path_buf(),
        }))
    }

    /// Look up a `#` specifier in a manifest's `imports`.
    fn imports_step(
        &self,
        cx: &Context<'_>,
        scope: &PackageScope,
        specifier: &str,
        parent: &Path,
    ) -> Result<Transition> {
        let not_defined = || Error::PackageImportNotDefined {
            specifier: specifier.to_string(),
            manifest: scope.manifest_path.clone(),
            from: cx.original_parent().to_string(),
        };

        let imports = scope.manifest.imports.as_ref().ok_or_else(not_defined)?;
        let (value, middle) = lookup_import(imports, specifier).ok_or_else(not_defined)?;
        let target = resolve_conditional_value(value, &cx.active).ok_or_else(not_defined)?;
        debug!(specifier, target, manifest = %scope.manifest_path.display(), "Imports entry");

        // `#` targets point at the bare node_modules directory
        if target.starts_with('#') {
            return Ok(Transition::Next(Step::Dependency {
                name: None,
                subpath: String::new(),
                parent: parent.to_path_buf(),
            }));
        }

        let specifier = match middle {
            Some(middle) => target.replace('*', middle),
            None => target.to_string(),
        };
        Ok(Transition::Next(Step::Specifier {
            specifier,
            referrer: Some(scope.manifest_path.display().to_string()),
        }))
    }

    /// Resolve a package found under `node_modules`.
    ///
    /// Falls back from `exports` to a direct subpath, then `main`, then
    /// `index.js`.
    fn dependency_step(
        &self,
        cx: &Context<'_>,
        name: Option<&str>,
        subpath: &str,
        parent: &Path,
    ) -> Result<ResolvedTarget> {
        let from = cx.original_parent();
        let root = find_dependency_root(&self.fs, name, parent).ok_or_else(|| {
            Error::PackageNotFound {
                package: name.unwrap_or("node_modules").to_string(),
                from: from.to_string(),
            }
        })?;

        let index = root.join(INDEX_FILE);
        let manifest_path = root.join(MANIFEST_FILE);
        let sub_file = (!subpath.is_empty()).then(|| normalize_path(&root.join(subpath)));
        let package_not_found = || Error::PackageNotFound {
            package: root.display().to_string(),
            from: from.to_string(),
        };

        let Some(manifest) = self.fs.read_manifest(&manifest_path)? else {
            debug!(root = %root.display(), "Dependency without a valid manifest");
            return match sub_file {
                Some(file) => self.existing_file(&file, from),
                None if self.fs.is_file(&index) => self.file_target(&index),
                None => Err(package_not_found()),
            };
        };

        if manifest.exports.is_some() {
            let scope = PackageScope {
                dir: root.clone(),
                manifest_path,
                manifest,
            };
            return self.exported_file(cx, &scope, subpath);
        }

        if let Some(file) = sub_file {
            return self.existing_file(&file, from);
        }

        if let Some(main) = &manifest.main {
            let main_file = normalize_path(&root.join(main));
            if self.fs.is_file(&main_file) {
                return self.file_target(&main_file);
            }
            debug!(main = %main_file.display(), "Missing main, trying index.js");
        }

        if self.fs.is_file(&index) {
            return self.file_target(&index);
        }
        Err(package_not_found())
    }

    /// Resolve `subpath` through a package's `exports` and check the file.
    fn exported_file(
        &self,
        cx: &Context<'_>,
        scope: &PackageScope,
        subpath: &str,
    ) -> Result<ResolvedTarget> {
        let Some(exports) = &scope.manifest.exports else {
            return Err(Error::InvalidManifest {
                path: scope.manifest_path.clone(),
            });
        };
        let from = cx.original_parent();
        let target = resolve_export(subpath, exports, &scope.manifest_path, from, &cx.active)?;
        let file = normalize_path(&scope.dir.join(target));
        self.existing_file(&file, from)
    }

    fn existing_file(&self, path: &Path, from: &str) -> Result<ResolvedTarget> {
        if self.fs.is_file(path) {
            self.file_target(path)
        } else {
            Err(Error::ModuleNotFound {
                module: path.display().to_string(),
                from: from.to_string(),
            })
        }
    }

    fn file_target(&self, path: &Path) -> Result<ResolvedTarget> {
        self.file_url(path).map(ResolvedTarget::File)
    }

    /// `file://` URL for `path` with its directory canonicalized.
    ///
    /// The file name itself is kept, so a symlinked file resolves to the
    /// link's location inside the package.
    pub(crate) fn file_url(&self, path: &Path) -> Result<Url> {
        let canonical = match path.file_name() {
            Some(name) => self.canonical_parent_dir(path).join(name),
            None => path.to_path_buf(),
        };
        Url::from_file_path(&canonical)
            .map_err(|()| Error::other(format!("cannot express {} as a file URL", canonical.display())))
    }

    /// The directory of `path` with symlinks resolved, without requiring
    /// `path` itself to exist.
    fn canonical_parent_dir(&self, path: &Path) -> PathBuf {
        let dir = path.parent().unwrap_or(path);
        self.fs.realpath(dir).unwrap_or_else(|_| dir.to_path_buf())
    }

    /// Turn a referrer (path or `file://` URL) into an absolute path.
    fn referrer_path(&self, referrer: &str, options: &ResolveOptions) -> Result<PathBuf> {
        let path = if referrer.starts_with(FILE_URL_PREFIX) {
            Url::parse(referrer)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| Error::InvalidSpecifier {
                    specifier: referrer.to_string(),
                })?
        } else {
            PathBuf::from(referrer)
        };
        if path.is_absolute() {
            Ok(normalize_path(&path))
        } else {
            Ok(normalize_path(&options.base_dir().join(path)))
        }
    }
}

/// Exact key first, then the most specific pattern key.
fn lookup_import<'a, 's>(
    imports: &'a ImportsTree,
    specifier: &'s str,
) -> Option<(&'a ConditionalValue, Option<&'s str>)> {
    if let Some(value) = imports.get(specifier) {
        return Some((value, None));
    }
    let (key, middle) = find_star_match(specifier, imports.keys())?;
    imports.get(key).map(|value| (value, Some(middle)))
}

/// Resolve with the default real-filesystem resolver.
pub fn resolve_import_sync(
    specifier: &str,
    referrer: Option<&str>,
    options: &ResolveOptions,
) -> Result<ResolvedTarget> {
    Resolver::new().resolve(specifier, referrer, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "package.json",
            r##"{
                "name": "app",
                "exports": {".": "./src/index.js", "./util": "./src/util.js"},
                "imports": {
                    "#dep": "dep",
                    "#internal/*": "./src/internal/*.js",
                    "#blocked": {"import": null, "default": "./src/index.js"},
                    "#nm": "#elsewhere"
                }
            }"##,
        );
        write(root, "src/index.js", "");
        write(root, "src/util.js", "");
        write(root, "src/internal/a.js", "");
        write(root, "node_modules/dep/package.json", r#"{"main": "./lib/main.js"}"#);
        write(root, "node_modules/dep/lib/main.js", "");
        write(root, "node_modules/index.js", "");
        write(root, "node_modules/plain/index.js", "");
        write(root, "node_modules/plain/extra/file.js", "");
        write(
            root,
            "node_modules/guarded/package.json",
            r#"{"exports": "./index.js"}"#,
        );
        write(root, "node_modules/guarded/index.js", "");
        dir
    }

    fn path_of(target: &ResolvedTarget) -> PathBuf {
        target.to_file_path().unwrap()
    }

    fn canonical(path: &Path) -> PathBuf {
        dunce::canonicalize(path).unwrap()
    }

    fn resolve(root: &Path, specifier: &str) -> Result<ResolvedTarget> {
        let referrer = root.join("src/index.js");
        Resolver::new().resolve(
            specifier,
            Some(&referrer.display().to_string()),
            &ResolveOptions::default(),
        )
    }

    #[test]
    fn test_empty_specifier() {
        let err = Resolver::new()
            .resolve("", None, &ResolveOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSpecifier { .. }));
    }

    #[test]
    fn test_relative() {
        let dir = fixture();
        let target = resolve(dir.path(), "./util.js").unwrap();
        assert_eq!(path_of(&target), canonical(&dir.path().join("src/util.js")));

        let target = resolve(dir.path(), "../src/internal/a.js").unwrap();
        assert_eq!(path_of(&target), canonical(&dir.path().join("src/internal/a.js")));
    }

    #[test]
    fn test_relative_missing_and_without_referrer() {
        let dir = fixture();
        let err = resolve(dir.path(), "./nope.js").unwrap_err();
        assert!(matches!(err, Error::ModuleNotFound { .. }));

        let err = Resolver::new()
            .resolve("./a.js", None, &ResolveOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::RelativeImportWithoutReferrer { .. }));
        assert_eq!(err.to_string(), "relative import without parentURL");
    }

    #[test]
    fn test_absolute_and_file_url() {
        let dir = fixture();
        let file = dir.path().join("src/util.js");
        let target = resolve(dir.path(), &file.display().to_string()).unwrap();
        assert_eq!(path_of(&target), canonical(&file));

        let url = Url::from_file_path(&file).unwrap();
        let target = resolve(dir.path(), url.as_str()).unwrap();
        assert_eq!(path_of(&target), canonical(&file));

        let missing = Url::from_file_path(dir.path().join("missing.js")).unwrap();
        let err = resolve(dir.path(), missing.as_str()).unwrap_err();
        assert!(matches!(err, Error::ModuleNotFound { .. }));
    }

    #[test]
    fn test_builtin() {
        let dir = fixture();
        assert_eq!(
            resolve(dir.path(), "node:fs").unwrap(),
            ResolvedTarget::Builtin("node:fs".into())
        );
        assert_eq!(
            resolve(dir.path(), "path").unwrap(),
            ResolvedTarget::Builtin("path".into())
        );
    }

    #[test]
    fn test_self_reference() {
        let dir = fixture();
        let target = resolve(dir.path(), "app/util").unwrap();
        assert_eq!(path_of(&target), canonical(&dir.path().join("src/util.js")));

        let err = resolve(dir.path(), "app/missing").unwrap_err();
        assert!(matches!(err, Error::SubpathNotExported { .. }));
    }

    #[test]
    fn test_imports_map() {
        let dir = fixture();
        let target = resolve(dir.path(), "#dep").unwrap();
        assert_eq!(path_of(&target), canonical(&dir.path().join("node_modules/dep/lib/main.js")));

        let target = resolve(dir.path(), "#internal/a").unwrap();
        assert_eq!(path_of(&target), canonical(&dir.path().join("src/internal/a.js")));

        let target = resolve(dir.path(), "#nm").unwrap();
        assert_eq!(path_of(&target), canonical(&dir.path().join("node_modules/index.js")));
    }

    #[test]
    fn test_imports_not_defined() {
        let dir = fixture();
        for specifier in ["#missing", "#blocked"] {
            let err = resolve(dir.path(), specifier).unwrap_err();
            assert!(
                matches!(err, Error::PackageImportNotDefined { .. }),
                "{specifier}: {err}"
            );
        }
    }

    #[test]
    fn test_dependency_fallbacks() {
        let dir = fixture();
        let target = resolve(dir.path(), "plain").unwrap();
        assert_eq!(path_of(&target), canonical(&dir.path().join("node_modules/plain/index.js")));

        let target = resolve(dir.path(), "plain/extra/file.js").unwrap();
        assert_eq!(
            path_of(&target),
            canonical(&dir.path().join("node_modules/plain/extra/file.js"))
        );

        let err = resolve(dir.path(), "plain/extra/none.js").unwrap_err();
        assert!(matches!(err, Error::ModuleNotFound { .. }));
    }

    #[test]
    fn test_exports_guard_subpaths() {
        let dir = fixture();
        assert!(resolve(dir.path(), "guarded").is_ok());
        let err = resolve(dir.path(), "guarded/sub").unwrap_err();
        assert!(matches!(err, Error::SubpathNotExported { ref subpath, .. } if subpath == "./sub"));
    }

    #[test]
    fn test_missing_package_uses_original_parent() {
        let dir = fixture();
        let options = ResolveOptions::default().with_original_parent("/outer/caller.js");
        let referrer = dir.path().join("src/index.js").display().to_string();
        let err = Resolver::new()
            .resolve("left-pad-not-installed", Some(&referrer), &options)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot find package 'left-pad-not-installed' imported from /outer/caller.js"
        );
    }

    #[test]
    fn test_bare_without_referrer_uses_cwd() {
        let dir = fixture();
        let options = ResolveOptions::default().with_cwd(dir.path());
        let target = Resolver::new().resolve("plain", None, &options).unwrap();
        assert_eq!(path_of(&target), canonical(&dir.path().join("node_modules/plain/index.js")));
    }
}
