use super::{print_json, read_field, report, Field, Global};
use esm_resolve_core::version::OUTPUT_SCHEMA_VERSION;
use esm_resolve_core::{all_conditions, unique_condition_sets};
use miette::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Serialize)]
struct ConditionsOutput<'a> {
    schema_version: u32,
    field: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conditions: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sets: Option<&'a [BTreeSet<String>]>,
}

pub fn run(global: &Global, manifest: &Path, field: Field, sets: bool) -> Result<()> {
    let tree = read_field(&global.path(manifest), field)?;

    if sets {
        let sets = unique_condition_sets(&tree).map_err(report)?;
        if global.json {
            return print_json(&ConditionsOutput {
                schema_version: OUTPUT_SCHEMA_VERSION,
                field: field.key(),
                conditions: None,
                sets: Some(&sets),
            });
        }
        for set in &sets {
            if set.is_empty() {
                println!("(default)");
            } else {
                println!("{}", set.iter().map(String::as_str).collect::<Vec<_>>().join(" + "));
            }
        }
        return Ok(());
    }

    let conditions = all_conditions(&tree).map_err(report)?;
    if global.json {
        return print_json(&ConditionsOutput {
            schema_version: OUTPUT_SCHEMA_VERSION,
            field: field.key(),
            conditions: Some(&conditions),
            sets: None,
        });
    }
    for condition in &conditions {
        println!("{condition}");
    }
    Ok(())
}
