use std::path::PathBuf;
use thiserror::Error;

/// Core error type for resolution.
///
/// Messages mirror the text the host loader prints for the same failure so
/// that tooling built on top can surface them unchanged.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid import() specifier: {specifier}")]
    InvalidSpecifier { specifier: String },

    #[error("Not a valid package: {}", .path.display())]
    InvalidManifest { path: PathBuf },

    #[error("relative import without parentURL")]
    RelativeImportWithoutReferrer { specifier: String },

    #[error(
        "{} in {} imported from {from}",
        not_exported_prefix(.subpath),
        .manifest.display()
    )]
    SubpathNotExported {
        subpath: String,
        manifest: PathBuf,
        from: String,
    },

    #[error("Cannot find package '{package}' imported from {from}")]
    PackageNotFound { package: String, from: String },

    #[error("Cannot find module '{module}' imported from {from}")]
    ModuleNotFound { module: String, from: String },

    #[error(
        "Package import specifier \"{specifier}\" is not defined in package {} imported from {from}",
        .manifest.display()
    )]
    PackageImportNotDefined {
        specifier: String,
        manifest: PathBuf,
        from: String,
    },

    #[error("invalid {field} object, all keys must start with {prefix}. Found {key}.")]
    InvalidSubpathKey {
        field: &'static str,
        prefix: char,
        key: String,
    },

    #[error("Expected valid import condition, got: {key}")]
    InvalidCondition { key: String },

    #[error("Invalid package target: {value}")]
    InvalidTarget { value: String },

    #[error("Failed to read options at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse options at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Other(String),
}

fn not_exported_prefix(subpath: &str) -> String {
    if subpath == "." {
        "No \"exports\" main defined".to_string()
    } else {
        format!("Package subpath '{subpath}' is not defined by \"exports\"")
    }
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// The host loader's error code for this failure, if it has one.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::InvalidSpecifier { .. } => Some("ERR_INVALID_MODULE_SPECIFIER"),
            Self::InvalidManifest { .. } => Some("ERR_INVALID_PACKAGE_CONFIG"),
            Self::SubpathNotExported { .. } => Some("ERR_PACKAGE_PATH_NOT_EXPORTED"),
            Self::PackageNotFound { .. } | Self::ModuleNotFound { .. } => {
                Some("ERR_MODULE_NOT_FOUND")
            }
            Self::PackageImportNotDefined { .. } => Some("ERR_PACKAGE_IMPORT_NOT_DEFINED"),
            Self::InvalidSubpathKey { .. }
            | Self::InvalidCondition { .. }
            | Self::InvalidTarget { .. } => Some("ERR_INVALID_PACKAGE_CONFIG"),
            Self::RelativeImportWithoutReferrer { .. }
            | Self::ConfigRead { .. }
            | Self::ConfigParse { .. }
            | Self::Other(_) => None,
        }
    }

    /// Whether this is a structural error in an exports/imports map.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InvalidSubpathKey { .. } | Self::InvalidCondition { .. } | Self::InvalidTarget { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
