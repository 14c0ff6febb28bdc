use super::{print_json, report, Global};
use esm_resolve_core::version::OUTPUT_SCHEMA_VERSION;
use esm_resolve_core::{AsyncResolver, ResolvedTarget};
use miette::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct ResolveOutput<'a> {
    schema_version: u32,
    specifier: &'a str,
    from: Option<&'a str>,
    target: &'a ResolvedTarget,
    builtin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
}

/// Resolve `specifier` from `from`, printing the target.
pub async fn run(global: &Global, specifier: &str, from: Option<&str>) -> Result<()> {
    let from = from.map(|referrer| anchor_referrer(global, referrer));
    let from = from.as_deref();
    let target = AsyncResolver::new()
        .resolve(specifier, from, &global.options)
        .await
        .map_err(report)?;

    if global.json {
        return print_json(&ResolveOutput {
            schema_version: OUTPUT_SCHEMA_VERSION,
            specifier,
            from,
            target: &target,
            builtin: target.is_builtin(),
            path: target.to_file_path(),
        });
    }

    match target.to_file_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("{target}"),
    }
    Ok(())
}

/// Relative referrer paths are taken from `--cwd`, not the process cwd.
fn anchor_referrer(global: &Global, referrer: &str) -> String {
    if referrer.starts_with("file:") || Path::new(referrer).is_absolute() {
        referrer.to_string()
    } else {
        global.path(Path::new(referrer)).display().to_string()
    }
}
