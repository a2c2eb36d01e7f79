#![cfg_attr(docsrs, feature(doc_cfg))]

//! # heft-stats
//!
//! Measure what an npm package costs a browser bundle.
//!
//! Given a package string, heft installs the package into a throwaway
//! sandbox, bundles a synthetic entry that imports it with rolldown, and
//! reports the minified and gzipped size of every emitted asset, the share
//! each dependency contributes, and optionally the size of every export on
//! its own.
//!
//! ## Quick Start
//!
//! ```no_run
//! use heft_stats::{StatsOptions, get_package_stats};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), heft_stats::Error> {
//! let stats = get_package_stats("react@18.2.0", &StatsOptions::default()).await?;
//! println!("{} bytes ({} gzipped)", stats.size, stats.gzip);
//! for dep in stats.build.dependency_sizes.iter().flatten() {
//!     println!("  {}: {}", dep.name, dep.approximate_size);
//! }
//! # Ok(()) }
//! ```
//!
//! ## Failures
//!
//! Every operation fails with one [`Error`] variant. A build whose only
//! problem is a few undeclared dependencies is retried once with those
//! dependencies treated as externals; the result then lists them in
//! `ignored_missing_dependencies`.
//!
//! ## Observability
//!
//! heft emits `tracing` events and never installs a subscriber. Phase
//! timings are logged under the [`telemetry::TARGET`] target. Enable the
//! `logging` feature for a ready-made subscriber.

pub mod api;
pub mod build;
pub mod bundler;
pub mod dependency_sizes;
pub mod error;
pub mod exports;
pub mod externals;
pub mod options;
pub mod package;
pub mod sandbox;
pub mod telemetry;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

pub use api::{Engine, PackageStats, get_all_package_exports, get_package_export_sizes, get_package_stats};
pub use build::{
    AssetStat, BuildOptions, BuildResult, ParseTime, build_package,
    build_package_ignoring_missing_deps, is_valid_package_name,
};
pub use bundler::{
    BundlerConfig, CompileCrash, CompileOutput, Compiler, EntryPoint, Minifier, OutputFiles,
    RolldownCompiler, Stats, StatsAsset, StatsError, StatsErrorKind, StatsModule, make_config,
};
pub use dependency_sizes::{DependencySize, bundle_size_tree, utf8_byte_len};
pub use error::{Error, OriginalError, Result};
pub use exports::{ExportGraphResolver, ExportMap};
pub use externals::{Externals, compute_externals};
pub use options::StatsOptions;
pub use package::{ManifestDetails, PackageIdentifier, PackageManifest};
pub use sandbox::{InstallClient, InstallOptions, Sandbox, SandboxManager};
