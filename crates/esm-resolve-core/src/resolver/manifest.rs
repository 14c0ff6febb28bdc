//! Typed view over `package.json`.
//!
//! `exports` and `imports` values are classified once, when the manifest is
//! read, into explicit tagged trees. [`PackageMap::classify`] is the only
//! place that inspects raw JSON shapes.

use crate::error::{Error, Result};
use serde_json::Value;

/// File name of a package manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// A conditional export/import target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalValue {
    /// Explicitly blocked.
    Null,
    /// A target specifier.
    Target(String),
    /// Fallbacks, tried in order.
    Fallbacks(Vec<ConditionalValue>),
    /// Condition name to value, in declaration order.
    Conditions(Vec<(String, ConditionalValue)>),
}

impl ConditionalValue {
    /// Build from raw JSON.
    ///
    /// Condition keys must not start with `.` or `#`. Empty keys are
    /// skipped.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::String(s) => Ok(Self::Target(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>>>()
                .map(Self::Fallbacks),
            Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (key, value) in map {
                    if key.is_empty() {
                        continue;
                    }
                    if is_subpath_key(key) {
                        return Err(Error::InvalidCondition { key: key.clone() });
                    }
                    entries.push((key.clone(), Self::from_json(value)?));
                }
                Ok(Self::Conditions(entries))
            }
            other => Err(Error::InvalidTarget {
                value: other.to_string(),
            }),
        }
    }

    /// Whether this value ends a fallback list (a string or `null`).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Null | Self::Target(_))
    }
}

/// The `exports` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportsTree {
    /// A bare value that applies to the `.` subpath.
    Root(ConditionalValue),
    /// Subpath (`.` or `./…`) to value, in declaration order.
    Subpaths(Vec<(String, ConditionalValue)>),
}

impl ExportsTree {
    pub fn from_json(value: &Value) -> Result<Self> {
        match PackageMap::classify(value)? {
            PackageMap::Exports(tree) => Ok(tree),
            PackageMap::Imports(imports) => Err(Error::InvalidSubpathKey {
                field: "exports",
                prefix: '.',
                key: imports.keys().next().unwrap_or_default().to_string(),
            }),
        }
    }

    /// The declared subpath keys. A root value exposes only `.`.
    #[must_use]
    pub fn subpaths(&self) -> Vec<&str> {
        match self {
            Self::Root(_) => vec!["."],
            Self::Subpaths(entries) => entries.iter().map(|(k, _)| k.as_str()).collect(),
        }
    }

    /// Look up an exact subpath key.
    #[must_use]
    pub fn get(&self, subpath: &str) -> Option<&ConditionalValue> {
        match self {
            Self::Root(value) => (subpath == ".").then_some(value),
            Self::Subpaths(entries) => lookup(entries, subpath),
        }
    }
}

/// The `imports` field: `#`-prefixed keys to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportsTree {
    entries: Vec<(String, ConditionalValue)>,
}

impl ImportsTree {
    pub fn from_json(value: &Value) -> Result<Self> {
        match PackageMap::classify(value)? {
            PackageMap::Imports(imports) => Ok(imports),
            PackageMap::Exports(ExportsTree::Root(ConditionalValue::Conditions(entries)))
                if entries.is_empty() =>
            {
                Ok(Self::default())
            }
            PackageMap::Exports(
                ExportsTree::Subpaths(entries)
                | ExportsTree::Root(ConditionalValue::Conditions(entries)),
            ) => Err(Error::InvalidSubpathKey {
                field: "imports",
                prefix: '#',
                key: entries.into_iter().next().map(|(k, _)| k).unwrap_or_default(),
            }),
            PackageMap::Exports(ExportsTree::Root(_)) => Err(Error::InvalidTarget {
                value: value.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, ConditionalValue)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConditionalValue> {
        lookup(&self.entries, key)
    }
}

/// A classified `exports` or `imports` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageMap {
    Exports(ExportsTree),
    Imports(ImportsTree),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Subpath,
    Import,
}

impl PackageMap {
    /// Classify a raw `exports`/`imports` value.
    ///
    /// An object whose first key is `.`, `./…` or `#…` is a subpath map and
    /// every other key must belong to the same family. Anything else is a
    /// bare conditional value for `.`.
    pub fn classify(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return ConditionalValue::from_json(value).map(|v| Self::Exports(ExportsTree::Root(v)));
        };

        let mut family: Option<KeyFamily> = None;
        let mut entries = Vec::with_capacity(map.len());

        for (key, target) in map {
            if key.is_empty() {
                continue;
            }
            let current = if let Some(f) = family {
                f
            } else {
                let first = if key.starts_with('#') {
                    KeyFamily::Import
                } else if key == "." || key.starts_with("./") {
                    KeyFamily::Subpath
                } else {
                    return ConditionalValue::from_json(value)
                        .map(|v| Self::Exports(ExportsTree::Root(v)));
                };
                family = Some(first);
                first
            };

            let valid = match current {
                KeyFamily::Import => key != "#" && key.starts_with('#'),
                KeyFamily::Subpath => key == "." || key.starts_with("./"),
            };
            if !valid {
                let (field, prefix) = match current {
                    KeyFamily::Import => ("imports", '#'),
                    KeyFamily::Subpath => ("exports", '.'),
                };
                return Err(Error::InvalidSubpathKey {
                    field,
                    prefix,
                    key: key.clone(),
                });
            }
            entries.push((key.clone(), ConditionalValue::from_json(target)?));
        }

        Ok(match family {
            Some(KeyFamily::Import) => Self::Imports(ImportsTree { entries }),
            Some(KeyFamily::Subpath) => Self::Exports(ExportsTree::Subpaths(entries)),
            None => Self::Exports(ExportsTree::Root(ConditionalValue::Conditions(Vec::new()))),
        })
    }

    /// Every `(key, value)` pair, with a root value reported under `.`.
    #[must_use]
    pub fn entries(&self) -> Vec<(&str, &ConditionalValue)> {
        match self {
            Self::Exports(ExportsTree::Root(value)) => vec![(".", value)],
            Self::Exports(ExportsTree::Subpaths(entries)) | Self::Imports(ImportsTree { entries }) => {
                entries.iter().map(|(k, v)| (k.as_str(), v)).collect()
            }
        }
    }
}

/// A parsed, shape-checked `package.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub name: Option<String>,
    pub main: Option<String>,
    pub module_type: Option<String>,
    pub module: Option<String>,
    pub exports: Option<ExportsTree>,
    pub imports: Option<ImportsTree>,
}

impl Manifest {
    /// Parse manifest source.
    ///
    /// Invalid JSON or a document that is not a manifest yields `Ok(None)`.
    /// A manifest whose `exports`/`imports` are malformed inside is still
    /// the governing manifest, so that is an error.
    pub fn parse(source: &str) -> Result<Option<Self>> {
        let Ok(value) = serde_json::from_str::<Value>(source) else {
            return Ok(None);
        };
        Self::from_json(&value)
    }

    /// Build from a JSON value, checking shape.
    ///
    /// `name`, `main` and `module` must be strings when present. `exports`
    /// must be a non-empty string, an array, or an object; `imports` must be
    /// an object with only `#` keys. Any other shape is `Ok(None)`.
    pub fn from_json(value: &Value) -> Result<Option<Self>> {
        let Some(obj) = value.as_object() else {
            return Ok(None);
        };
        let (Some(name), Some(main), Some(module)) = (
            optional_string(obj.get("name")),
            optional_string(obj.get("main")),
            optional_string(obj.get("module")),
        ) else {
            return Ok(None);
        };
        let module_type = obj.get("type").and_then(Value::as_str).map(str::to_string);

        let exports = match obj.get("exports") {
            None => None,
            Some(Value::String(s)) if s.is_empty() => return Ok(None),
            Some(v @ (Value::String(_) | Value::Array(_) | Value::Object(_))) => {
                Some(ExportsTree::from_json(v)?)
            }
            Some(_) => return Ok(None),
        };

        let imports = match obj.get("imports") {
            None => None,
            Some(v @ Value::Object(map)) if map.keys().all(|k| k.starts_with('#')) => {
                Some(ImportsTree::from_json(v)?)
            }
            Some(_) => return Ok(None),
        };

        Ok(Some(Self {
            name,
            main,
            module_type,
            module,
            exports,
            imports,
        }))
    }
}

/// `Some(None)` when absent, `Some(Some(s))` for a string, `None` otherwise.
#[allow(clippy::option_option)]
fn optional_string(value: Option<&Value>) -> Option<Option<String>> {
    match value {
        None => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(_) => None,
    }
}

fn is_subpath_key(key: &str) -> bool {
    key.starts_with('.') || key.starts_with('#')
}

fn lookup<'a>(entries: &'a [(String, ConditionalValue)], key: &str) -> Option<&'a ConditionalValue> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}
