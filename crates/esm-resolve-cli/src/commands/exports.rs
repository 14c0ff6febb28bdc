use super::{print_json, print_map, read_field, report, Field, Global};
use esm_resolve_core::version::OUTPUT_SCHEMA_VERSION;
use esm_resolve_core::{named_exports_list, AsyncResolver, ResolutionMap};
use miette::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ExportsOutput<'a> {
    schema_version: u32,
    manifest: &'a Path,
    exports: &'a ResolutionMap,
}

#[derive(Serialize)]
struct DeclaredOutput<'a> {
    schema_version: u32,
    manifest: &'a Path,
    subpaths: &'a [String],
}

/// Resolve every exported subpath, expanding wildcards against the
/// package directory.
pub async fn run(global: &Global, manifest: &Path) -> Result<()> {
    let manifest = global.path(manifest);
    let exports = AsyncResolver::new()
        .resolve_all_exports(&manifest, &global.options)
        .await
        .map_err(report)?;

    if global.json {
        return print_json(&ExportsOutput {
            schema_version: OUTPUT_SCHEMA_VERSION,
            manifest: &manifest,
            exports: &exports,
        });
    }
    print_map(&exports);
    Ok(())
}

/// Print the subpath keys as declared.
pub fn declared(global: &Global, manifest: &Path) -> Result<()> {
    let manifest = global.path(manifest);
    let exports = read_field(&manifest, Field::Exports)?;
    let subpaths = named_exports_list(&exports);

    if global.json {
        return print_json(&DeclaredOutput {
            schema_version: OUTPUT_SCHEMA_VERSION,
            manifest: &manifest,
            subpaths: &subpaths,
        });
    }
    for subpath in &subpaths {
        println!("{subpath}");
    }
    Ok(())
}
