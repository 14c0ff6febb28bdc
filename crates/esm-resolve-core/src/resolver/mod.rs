//! Module resolver for ES module specifiers.
//!
//! Leaves first: wildcard key matching, conditional values, subpath
//! exports, the package walker, then the resolution engine, the bulk
//! resolver and its async front end. Enumeration works on raw manifest
//! values and never touches the filesystem.

mod builtins;
mod bulk;
mod conditions;
mod engine;
mod enumerate;
mod exports;
mod fs;
mod manifest;
mod nonblocking;
mod pattern;
mod specifier;
mod target;
mod walker;

pub use builtins::{is_builtin, BUILTIN_MODULES, NODE_PREFIX};
pub use bulk::{
    resolve_all_exports_sync, resolve_all_local_imports_sync, BulkEntry, PackageContext,
    ResolutionMap,
};
pub use conditions::{resolve_condition_entries, resolve_conditional_value};
pub use engine::{resolve_import_sync, Resolver};
pub use enumerate::{
    all_conditional_values, all_conditions, conditional_values_list, named_exports_list,
    unique_condition_sets, ConditionalValueEntry,
};
pub use exports::{normalize_subpath, resolve_export};
pub use fs::{FileSystem, RealFileSystem};
pub use manifest::{ConditionalValue, ExportsTree, ImportsTree, Manifest, PackageMap, MANIFEST_FILE};
pub use nonblocking::{resolve_all_exports, resolve_all_local_imports, resolve_import, AsyncResolver};
pub use pattern::{find_star_match, split_star};
pub use specifier::{is_relative_specifier, parse_package_specifier};
pub use target::ResolvedTarget;
pub use walker::{find_dependency_root, nearest_package_scope, PackageScope};
