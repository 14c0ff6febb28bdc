#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use commands::{Field, Global};
use esm_resolve_core::ResolveOptions;
use miette::Result;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "esm-resolve")]
#[command(author, version, about = "Resolve ESM imports the way the host runtime would", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Load resolve options from a JSON file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Extra conditions, appended to the defaults (`!name` removes one)
    #[arg(
        short = 'C',
        long = "condition",
        global = true,
        value_delimiter = ',',
        env = "ESM_RESOLVE_CONDITIONS",
        value_name = "NAME"
    )]
    conditions: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Resolve one import specifier
    Resolve {
        /// The specifier as written in the import statement
        specifier: String,

        /// Path or file:// URL of the importing module
        #[arg(long, value_name = "REFERRER")]
        from: Option<String>,
    },

    /// Resolve every subpath a package exports
    Exports {
        /// Path to the package's package.json
        manifest: PathBuf,

        /// List the declared subpath keys without touching the filesystem
        #[arg(long)]
        declared: bool,
    },

    /// Resolve every entry of a package's imports map, expanding wildcards
    Imports {
        /// Path to the package's package.json
        manifest: PathBuf,
    },

    /// List the conditions an exports or imports map is sensitive to
    Conditions {
        /// Path to the package's package.json
        manifest: PathBuf,

        /// Which map to inspect
        #[arg(long, value_enum, default_value_t = Field::Exports)]
        field: Field,

        /// Print the distinct condition sets instead of single conditions
        #[arg(long)]
        sets: bool,
    },

    /// List the targets an exports or imports map can resolve to
    Values {
        /// Path to the package's package.json
        manifest: PathBuf,

        /// Which map to inspect
        #[arg(long, value_enum, default_value_t = Field::Exports)]
        field: Field,

        /// Print every reachable (subpath, conditions, value) outcome
        #[arg(long)]
        entries: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.log_json);

    let cwd = cli
        .cwd
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut options = match &cli.config {
        Some(path) => ResolveOptions::from_json_file(&cwd.join(path)).map_err(commands::report)?,
        None => ResolveOptions::default(),
    };
    options.conditions.extend(cli.conditions.iter().cloned());
    if let Some(dir) = &cli.cwd {
        options = options.with_cwd(dir.clone());
    }
    debug!(cwd = %cwd.display(), conditions = ?options.conditions, "Options ready");

    let global = Global {
        cwd,
        json: cli.json,
        options,
    };

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(&global),
        Some(Commands::Resolve { specifier, from }) => {
            commands::resolve::run(&global, &specifier, from.as_deref()).await
        }
        Some(Commands::Exports { manifest, declared }) => {
            if declared {
                commands::exports::declared(&global, &manifest)
            } else {
                commands::exports::run(&global, &manifest).await
            }
        }
        Some(Commands::Imports { manifest }) => commands::imports::run(&global, &manifest).await,
        Some(Commands::Conditions {
            manifest,
            field,
            sets,
        }) => commands::conditions::run(&global, &manifest, field, sets),
        Some(Commands::Values {
            manifest,
            field,
            entries,
        }) => commands::values::run(&global, &manifest, field, entries),
    }
}
