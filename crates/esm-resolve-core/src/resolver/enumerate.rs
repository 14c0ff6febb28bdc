//! Static analysis of `exports` and `imports` values.
//!
//! Nothing here touches the filesystem. Every function takes the raw JSON
//! value from a manifest. All but [`named_exports_list`] fail when its keys
//! mix subpath families or a condition map contains a subpath-shaped key.

use super::manifest::{ConditionalValue, PackageMap};
use crate::config::DEFAULT_CONDITION;
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// One reachable outcome of a conditional value.
///
/// Any active condition set that is a superset of `conditions` (and is not
/// claimed by an earlier entry) produces `value`. A `None` value is an
/// explicit block that still shadows later alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalValueEntry {
    pub subpath: String,
    pub conditions: BTreeSet<String>,
    pub value: Option<String>,
}

/// Every condition the tree is sensitive to, sorted, without `default`.
///
/// Keys after a `default` key and array members after a string or `null`
/// are unreachable and not reported.
pub fn all_conditions(tree: &Value) -> Result<Vec<String>> {
    let map = PackageMap::classify(tree)?;
    let mut conditions = BTreeSet::new();
    for (_, value) in map.entries() {
        collect_conditions(value, &mut conditions);
    }
    Ok(conditions.into_iter().collect())
}

fn collect_conditions(value: &ConditionalValue, out: &mut BTreeSet<String>) {
    match value {
        ConditionalValue::Null | ConditionalValue::Target(_) => {}
        ConditionalValue::Fallbacks(items) => {
            for item in items {
                if item.is_terminal() {
                    break;
                }
                collect_conditions(item, out);
            }
        }
        ConditionalValue::Conditions(entries) => {
            for (key, value) in entries {
                collect_conditions(value, out);
                if key == DEFAULT_CONDITION {
                    break;
                }
                out.insert(key.clone());
            }
        }
    }
}

/// Every reachable `(subpath, conditions, value)` outcome, in declaration
/// order.
pub fn conditional_values_list(tree: &Value) -> Result<Vec<ConditionalValueEntry>> {
    let map = PackageMap::classify(tree)?;
    let mut list = Vec::new();
    for (subpath, value) in map.entries() {
        let mut reached = Vec::new();
        collect_values(value, &BTreeSet::new(), &mut reached);
        list.extend(
            reached
                .into_iter()
                .map(|(conditions, value)| ConditionalValueEntry {
                    subpath: subpath.to_string(),
                    conditions,
                    value,
                }),
        );
    }
    Ok(list)
}

type Reached = Vec<(BTreeSet<String>, Option<String>)>;

fn collect_values(value: &ConditionalValue, path: &BTreeSet<String>, list: &mut Reached) {
    match value {
        ConditionalValue::Null => list.push((path.clone(), None)),
        ConditionalValue::Target(target) => list.push((path.clone(), Some(target.clone()))),
        ConditionalValue::Fallbacks(items) => {
            for item in items {
                collect_values(item, path, list);
                if item.is_terminal() {
                    break;
                }
            }
        }
        ConditionalValue::Conditions(entries) => {
            for (key, value) in entries {
                let is_default = key == DEFAULT_CONDITION;
                let mut next = path.clone();
                if !is_default {
                    next.insert(key.clone());
                }
                // an earlier outcome with a subset of these conditions
                // always wins, so this branch can never be selected
                let shadowed = list.iter().any(|(seen, _)| seen.is_subset(&next));
                if !shadowed {
                    collect_values(value, &next, list);
                }
                if is_default {
                    break;
                }
            }
        }
    }
}

/// The distinct condition sets of [`conditional_values_list`], first seen
/// first.
pub fn unique_condition_sets(tree: &Value) -> Result<Vec<BTreeSet<String>>> {
    let mut sets: Vec<BTreeSet<String>> = Vec::new();
    for entry in conditional_values_list(tree)? {
        if !sets.contains(&entry.conditions) {
            sets.push(entry.conditions);
        }
    }
    Ok(sets)
}

/// Every reachable non-null target, deduplicated, first seen first.
///
/// Wildcards are not expanded.
pub fn all_conditional_values(tree: &Value) -> Result<Vec<String>> {
    let mut values: Vec<String> = Vec::new();
    for entry in conditional_values_list(tree)? {
        if let Some(value) = entry.value {
            if !values.contains(&value) {
                values.push(value);
            }
        }
    }
    Ok(values)
}

/// The declared subpath keys of an `exports` value.
///
/// Only an object made purely of `.`/`./…` keys lists its keys; any other
/// non-empty value, mixed maps included, counts as the single `.` export.
/// Nothing is validated.
#[must_use]
pub fn named_exports_list(exports: &Value) -> Vec<String> {
    match exports {
        Value::Null | Value::Bool(false) => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::Object(map) if map.keys().all(|k| k == "." || k.starts_with("./")) => {
            map.keys().cloned().collect()
        }
        _ => vec![".".to_string()],
    }
}
