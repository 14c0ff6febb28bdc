#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! ESM import resolution outside the host runtime.
//!
//! Resolves import specifiers against `package.json` `exports`/`imports`
//! maps, `node_modules` lookups and built-in names, and statically
//! enumerates what an exports/imports map can resolve to.

pub mod config;
pub mod error;
pub mod resolver;
pub mod version;

pub use config::{ActiveConditions, ResolveOptions, DEFAULT_CONDITIONS};
pub use error::{Error, Result};
pub use resolver::{
    all_conditional_values, all_conditions, conditional_values_list, is_builtin,
    named_exports_list, parse_package_specifier, resolve_all_exports, resolve_all_exports_sync,
    resolve_all_local_imports, resolve_all_local_imports_sync, resolve_conditional_value,
    resolve_import, resolve_import_sync, unique_condition_sets, AsyncResolver,
    ConditionalValue, ConditionalValueEntry, ExportsTree, FileSystem, ImportsTree, Manifest,
    RealFileSystem, ResolutionMap, ResolvedTarget, Resolver,
};
pub use version::VERSION;
