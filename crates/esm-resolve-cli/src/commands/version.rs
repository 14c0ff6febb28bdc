use super::{print_json, Global};
use esm_resolve_core::version::{version_string, OUTPUT_SCHEMA_VERSION};
use esm_resolve_core::VERSION;
use miette::Result;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput {
    schema_version: u32,
    version: &'static str,
}

pub fn run(global: &Global) -> Result<()> {
    if global.json {
        return print_json(&VersionOutput {
            schema_version: OUTPUT_SCHEMA_VERSION,
            version: VERSION,
        });
    }
    println!("{}", version_string());
    Ok(())
}
