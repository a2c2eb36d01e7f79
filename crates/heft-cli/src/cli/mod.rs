//! Command-line interface definition.
//!
//! - `heft stats <package>` - bundle, gzip and dependency sizes
//! - `heft exports <package>` - every export and the file defining it
//! - `heft export-sizes <package>` - the cost of each export on its own

mod commands;
pub mod enums;
mod validation;

use clap::Parser;

pub use commands::{Command, MeasureArgs};
pub use enums::*;
pub use validation::{parse_concurrency, parse_import_name};

/// heft - what does this npm package cost a browser bundle?
#[derive(Parser, Debug)]
#[command(
    name = "heft",
    version,
    about = "Measure the bundle cost of npm packages",
    long_about = "heft installs a package into a throwaway sandbox, bundles it with rolldown\n\
                  and reports the minified and gzipped size of the result, the share each\n\
                  dependency contributes and, on request, the size of every export."
)]
pub struct Cli {
    /// Enable verbose logging, including per-phase timings
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
