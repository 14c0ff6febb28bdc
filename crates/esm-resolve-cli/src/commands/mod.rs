pub mod conditions;
pub mod exports;
pub mod imports;
pub mod resolve;
pub mod values;
pub mod version;

use esm_resolve_core::{Error, ResolutionMap, ResolveOptions};
use miette::{IntoDiagnostic, MietteDiagnostic, Report, Result, WrapErr};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Settings shared by every subcommand.
#[derive(Debug)]
pub struct Global {
    pub cwd: PathBuf,
    pub json: bool,
    pub options: ResolveOptions,
}

impl Global {
    /// Anchor a user-supplied path at the working directory.
    pub fn path(&self, path: &Path) -> PathBuf {
        self.cwd.join(path)
    }
}

/// Which package.json map a static command reads.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Exports,
    Imports,
}

impl Field {
    pub fn key(self) -> &'static str {
        match self {
            Self::Exports => "exports",
            Self::Imports => "imports",
        }
    }
}

/// Turn a resolver error into a diagnostic carrying its error code.
pub fn report(err: Error) -> Report {
    let mut diagnostic = MietteDiagnostic::new(err.to_string());
    if let Some(code) = err.code() {
        diagnostic = diagnostic.with_code(code);
    }
    Report::new(diagnostic)
}

/// Read one top-level field of a manifest as raw JSON.
pub fn read_field(manifest: &Path, field: Field) -> Result<Value> {
    let source = std::fs::read_to_string(manifest)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", manifest.display()))?;
    let mut json: Value = serde_json::from_str(&source)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to parse {}", manifest.display()))?;
    match json.get_mut(field.key()) {
        Some(value) if !value.is_null() => Ok(value.take()),
        _ => Err(miette::miette!(
            "{} has no `{}` field",
            manifest.display(),
            field.key()
        )),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

/// Print a bulk resolution as `key -> target` lines.
pub fn print_map(map: &ResolutionMap) {
    let width = map.keys().map(String::len).max().unwrap_or(0);
    for (key, target) in map {
        println!("{key:<width$}  {target}");
    }
}
