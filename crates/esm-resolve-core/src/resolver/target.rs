use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// What a specifier resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedTarget {
    /// A canonical `file://` location.
    File(Url),
    /// A built-in module name, returned as given.
    Builtin(String),
}

impl ResolvedTarget {
    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Self::File(url) => Some(url),
            Self::Builtin(_) => None,
        }
    }

    /// The filesystem path of a file target.
    #[must_use]
    pub fn to_file_path(&self) -> Option<PathBuf> {
        self.as_url().and_then(|url| url.to_file_path().ok())
    }

    #[must_use]
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin(_))
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(url) => write!(f, "{url}"),
            Self::Builtin(name) => write!(f, "{name}"),
        }
    }
}

impl Serialize for ResolvedTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
