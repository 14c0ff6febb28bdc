//! Async front end.
//!
//! The algorithm is the blocking one; every filesystem-touching piece runs
//! on tokio's blocking pool via `spawn_blocking`. Bulk operations fan out
//! one task per entry and join them, so results match the blocking
//! [`Resolver`] for the same filesystem state.

use super::bulk::{BulkEntry, PackageContext, ResolutionMap};
use super::engine::Resolver;
use super::fs::{FileSystem, RealFileSystem};
use super::target::ResolvedTarget;
use crate::config::ResolveOptions;
use crate::error::{Error, Result};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Async wrapper around a shared [`Resolver`].
#[derive(Debug)]
pub struct AsyncResolver<F = RealFileSystem> {
    inner: Arc<Resolver<F>>,
}

impl<F> Clone for AsyncResolver<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl AsyncResolver<RealFileSystem> {
    #[must_use]
    pub fn new() -> Self {
        Self::from_resolver(Resolver::new())
    }
}

impl Default for AsyncResolver<RealFileSystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem + 'static> AsyncResolver<F> {
    pub fn from_resolver(resolver: Resolver<F>) -> Self {
        Self {
            inner: Arc::new(resolver),
        }
    }

    /// The wrapped blocking resolver.
    pub fn blocking(&self) -> &Resolver<F> {
        &self.inner
    }

    /// Async twin of [`Resolver::resolve`].
    pub async fn resolve(
        &self,
        specifier: &str,
        referrer: Option<&str>,
        options: &ResolveOptions,
    ) -> Result<ResolvedTarget> {
        let specifier = specifier.to_string();
        let referrer = referrer.map(str::to_string);
        let options = options.clone();
        self.run(move |resolver| resolver.resolve(&specifier, referrer.as_deref(), &options))
            .await?
    }

    /// Async twin of [`Resolver::resolve_all_exports`].
    pub async fn resolve_all_exports(
        &self,
        manifest_path: &Path,
        options: &ResolveOptions,
    ) -> Result<ResolutionMap> {
        let (package, entries) = self.plan(manifest_path, options, Resolver::plan_exports).await?;
        let package = Arc::new(package);

        let tasks = entries.into_iter().map(|entry| {
            let package = Arc::clone(&package);
            self.run(move |resolver| resolver.expand_export(&package, &entry))
        });
        merge(join_all(tasks).await)
    }

    /// Async twin of [`Resolver::resolve_all_local_imports`].
    pub async fn resolve_all_local_imports(
        &self,
        manifest_path: &Path,
        options: &ResolveOptions,
    ) -> Result<ResolutionMap> {
        let (package, entries) = self.plan(manifest_path, options, Resolver::plan_imports).await?;
        let package = Arc::new(package);
        let options = Arc::new(options.clone());

        let tasks = entries.into_iter().map(|entry| {
            let package = Arc::clone(&package);
            let options = Arc::clone(&options);
            self.run(move |resolver| resolver.expand_import(&package, &entry, &options))
        });
        merge(join_all(tasks).await)
    }

    async fn plan(
        &self,
        manifest_path: &Path,
        options: &ResolveOptions,
        plan: fn(&Resolver<F>, &Path, &ResolveOptions) -> Result<(PackageContext, Vec<BulkEntry>)>,
    ) -> Result<(PackageContext, Vec<BulkEntry>)> {
        let manifest_path: PathBuf = manifest_path.to_path_buf();
        let options = options.clone();
        self.run(move |resolver| plan(resolver, &manifest_path, &options))
            .await?
    }

    /// Run `f` against the resolver on the blocking pool.
    async fn run<T, G>(&self, f: G) -> Result<T>
    where
        T: Send + 'static,
        G: FnOnce(&Resolver<F>) -> T + Send + 'static,
    {
        let resolver = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&resolver))
            .await
            .map_err(|e| Error::other(format!("resolver task failed: {e}")))
    }
}

fn merge(parts: Vec<Result<ResolutionMap>>) -> Result<ResolutionMap> {
    let mut out = ResolutionMap::new();
    for part in parts {
        out.extend(part?);
    }
    Ok(out)
}

/// Async twin of [`super::engine::resolve_import_sync`].
pub async fn resolve_import(
    specifier: &str,
    referrer: Option<&str>,
    options: &ResolveOptions,
) -> Result<ResolvedTarget> {
    AsyncResolver::new().resolve(specifier, referrer, options).await
}

/// Async twin of [`super::bulk::resolve_all_exports_sync`].
pub async fn resolve_all_exports(
    manifest_path: &Path,
    options: &ResolveOptions,
) -> Result<ResolutionMap> {
    AsyncResolver::new()
        .resolve_all_exports(manifest_path, options)
        .await
}

/// Async twin of [`super::bulk::resolve_all_local_imports_sync`].
pub async fn resolve_all_local_imports(
    manifest_path: &Path,
    options: &ResolveOptions,
) -> Result<ResolutionMap> {
    AsyncResolver::new()
        .resolve_all_local_imports(manifest_path, options)
        .await
}
