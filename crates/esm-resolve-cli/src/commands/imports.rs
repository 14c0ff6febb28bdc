use super::{print_json, print_map, report, Global};
use esm_resolve_core::version::OUTPUT_SCHEMA_VERSION;
use esm_resolve_core::{AsyncResolver, ResolutionMap};
use miette::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ImportsOutput<'a> {
    schema_version: u32,
    manifest: &'a Path,
    imports: &'a ResolutionMap,
}

/// Resolve the package's own imports map, plus its dependencies' exports
/// for entries that point at a bare package.
pub async fn run(global: &Global, manifest: &Path) -> Result<()> {
    let manifest = global.path(manifest);
    let imports = AsyncResolver::new()
        .resolve_all_local_imports(&manifest, &global.options)
        .await
        .map_err(report)?;

    if global.json {
        return print_json(&ImportsOutput {
            schema_version: OUTPUT_SCHEMA_VERSION,
            manifest: &manifest,
            imports: &imports,
        });
    }
    print_map(&imports);
    Ok(())
}
