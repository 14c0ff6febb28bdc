use super::{print_json, read_field, report, Field, Global};
use esm_resolve_core::version::OUTPUT_SCHEMA_VERSION;
use esm_resolve_core::{all_conditional_values, conditional_values_list, ConditionalValueEntry};
use miette::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ValuesOutput<'a> {
    schema_version: u32,
    field: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<&'a [ConditionalValueEntry]>,
}

pub fn run(global: &Global, manifest: &Path, field: Field, entries: bool) -> Result<()> {
    let tree = read_field(&global.path(manifest), field)?;

    if entries {
        let entries = conditional_values_list(&tree).map_err(report)?;
        if global.json {
            return print_json(&ValuesOutput {
                schema_version: OUTPUT_SCHEMA_VERSION,
                field: field.key(),
                values: None,
                entries: Some(&entries),
            });
        }
        for entry in &entries {
            let conditions = entry
                .conditions
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(",");
            println!(
                "{}\t[{}]\t{}",
                entry.subpath,
                conditions,
                entry.value.as_deref().unwrap_or("null")
            );
        }
        return Ok(());
    }

    let values = all_conditional_values(&tree).map_err(report)?;
    if global.json {
        return print_json(&ValuesOutput {
            schema_version: OUTPUT_SCHEMA_VERSION,
            field: field.key(),
            values: Some(&values),
            entries: None,
        });
    }
    for value in &values {
        println!("{value}");
    }
    Ok(())
}
