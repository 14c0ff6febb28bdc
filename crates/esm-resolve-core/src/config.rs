use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Conditions active when the caller does not supply any.
pub const DEFAULT_CONDITIONS: &[&str] = &["import", "node"];

/// The condition that is always active and ends a condition map.
pub const DEFAULT_CONDITION: &str = "default";

/// Prefix that removes a condition from the active set.
pub const NEGATION_PREFIX: char = '!';

/// Options for a single resolution call.
///
/// Immutable per top-level call and threaded unchanged through nested
/// resolutions, except that the engine fills in `original_parent` the first
/// time it has to walk manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveOptions {
    /// Conditions in order. `!name` removes `name` from the active set.
    pub conditions: Vec<String>,

    /// The outermost referrer, only used in error messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_parent: Option<String>,

    /// Base directory used when no referrer is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            conditions: DEFAULT_CONDITIONS.iter().map(|c| (*c).to_string()).collect(),
            original_parent: None,
            cwd: None,
        }
    }
}

impl ResolveOptions {
    /// Replace the condition list.
    #[must_use]
    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = conditions.into_iter().map(Into::into).collect();
        self
    }

    /// Append one condition (or `!name` negation).
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Set the base directory for referrer-less resolution.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set the referrer reported in error messages.
    #[must_use]
    pub fn with_original_parent(mut self, parent: impl Into<String>) -> Self {
        self.original_parent = Some(parent.into());
        self
    }

    /// Load options from a JSON file.
    ///
    /// Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&source).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Compute the effective set of active conditions.
    #[must_use]
    pub fn active_conditions(&self) -> ActiveConditions {
        ActiveConditions::new(&self.conditions)
    }

    /// The directory relative specifiers and paths are anchored to when
    /// there is no referrer.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.cwd
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// The effective set of conditions for one resolution.
///
/// Starts from `{"default"}`, then applies each configured condition in
/// order: a plain name is added, a `!name` entry removes `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConditions {
    set: HashSet<String>,
}

impl ActiveConditions {
    pub fn new<S: AsRef<str>>(conditions: &[S]) -> Self {
        let mut set = HashSet::new();
        set.insert(DEFAULT_CONDITION.to_string());
        for condition in conditions {
            let condition = condition.as_ref();
            if let Some(negated) = condition.strip_prefix(NEGATION_PREFIX) {
                set.remove(negated);
            } else {
                set.insert(condition.to_string());
            }
        }
        Self { set }
    }

    #[must_use]
    pub fn contains(&self, condition: &str) -> bool {
        self.set.contains(condition)
    }
}

impl Default for ActiveConditions {
    fn default() -> Self {
        Self::new(DEFAULT_CONDITIONS)
    }
}
