use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::enums::{Client, MinifierKind};
use crate::cli::validation::{parse_concurrency, parse_import_name};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Measure the minified and gzipped size of a package
    ///
    /// Installs the package, bundles `require('<package>')` and reports every
    /// emitted asset plus a per-dependency breakdown.
    ///
    /// Examples:
    ///   heft stats react
    ///   heft stats @babel/core@7.23.0 --client pnpm
    ///   heft stats lodash --import map --import filter
    Stats(MeasureArgs),

    /// List every export of a package and the file that defines it
    ///
    /// Follows `export * from` chains through the whole package.
    Exports(MeasureArgs),

    /// Measure each export of a package on its own
    ///
    /// Builds one `import { name } from '<package>'` entry per export.
    ExportSizes(MeasureArgs),
}

/// Arguments shared by every measurement.
///
/// Unset options fall back to `heft.config.json`, then `HEFT_*`
/// environment variables, then built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct MeasureArgs {
    /// Package to measure: `name`, `name@version`, `@scope/name@version` or
    /// a path to a directory containing package.json
    #[arg(value_name = "PACKAGE")]
    pub package: String,

    /// Package manager used to install the package
    #[arg(long, value_enum)]
    pub client: Option<Client>,

    /// Minifier used for bundles and dependency sizes
    #[arg(long, value_enum)]
    pub minifier: Option<MinifierKind>,

    /// Abort the install after this many milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub install_timeout: Option<u64>,

    /// Maximum concurrent network requests (yarn only)
    #[arg(long, value_name = "N", value_parser = parse_concurrency)]
    pub network_concurrency: Option<u32>,

    /// Serialize package manager network access (yarn only)
    #[arg(long)]
    pub limit_concurrency: bool,

    /// Import only these exports instead of the whole package
    ///
    /// Repeat for several exports:
    ///   --import map --import filter
    #[arg(long = "import", value_name = "NAME", value_parser = parse_import_name)]
    pub imports: Vec<String>,

    /// Build one entry per --import instead of a single combined entry
    #[arg(long, requires = "imports")]
    pub split: bool,

    /// Measure the parse time of JS assets
    #[arg(long)]
    pub parse: bool,

    /// Skip the per-dependency size breakdown
    #[arg(long)]
    pub no_dependency_sizes: bool,

    /// Keep the sandbox and write the bundle to <sandbox>/dist
    #[arg(long)]
    pub debug: bool,

    /// Root directory for sandboxes and package manager caches
    #[arg(long, value_name = "DIR")]
    pub tmp_dir: Option<PathBuf>,

    /// Path to a config file (default: ./heft.config.json if present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,
}
