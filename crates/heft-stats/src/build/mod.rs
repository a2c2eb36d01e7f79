//! Build orchestration.
//!
//! [`build_package`] writes the synthetic entries, runs a [`Compiler`],
//! classifies its output and measures the assets.
//! [`build_package_ignoring_missing_deps`] adds a single retry for builds
//! that only failed because a handful of undeclared dependencies are
//! missing: those are externalized and the build runs once more.

mod assets;
mod classify;
mod entry;

pub use assets::{AssetStat, ParseTime, gzip_size, parse_time};
pub use classify::is_valid_package_name;
pub use entry::{
    DEFAULT_ENTRY_FILENAME, EntryOptions, MAIN_ENTRY, create_entry_point, entry_source,
    split_entry_filename,
};

use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use crate::bundler::{Compiler, EntryPoint, Minifier, make_config};
use crate::dependency_sizes::{DependencySize, bundle_size_tree};
use crate::externals::Externals;
use crate::telemetry::{self, Phase};
use crate::{Error, Result};

/// Most missing dependencies a build may ignore through the retry.
pub const MAX_IGNORED_MISSING_DEPENDENCIES: usize = 6;

/// Per-build knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub minifier: Minifier,
    /// Import only these bindings.
    pub custom_imports: Option<Vec<String>>,
    /// One entry (and asset) per custom import.
    pub split_custom_imports: bool,
    pub include_dependency_sizes: bool,
    pub calc_parse: bool,
    /// Keep emitted files in `<sandbox>/dist`.
    pub debug: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub assets: Vec<AssetStat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_sizes: Option<Vec<DependencySize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_missing_dependencies: Option<Vec<String>>,
}

async fn write_entries(
    name: &str,
    install_path: &Path,
    options: &BuildOptions,
) -> Result<Vec<EntryPoint>> {
    if !options.split_custom_imports {
        let path = create_entry_point(
            name,
            install_path,
            &EntryOptions {
                esm: false,
                custom_imports: options.custom_imports.as_deref(),
                entry_filename: None,
            },
        )
        .await?;
        return Ok(vec![EntryPoint {
            name: MAIN_ENTRY.to_string(),
            path,
        }]);
    }

    let mut entries = Vec::new();
    for import in options.custom_imports.iter().flatten() {
        let filename = split_entry_filename(import);
        let path = create_entry_point(
            name,
            install_path,
            &EntryOptions {
                esm: true,
                custom_imports: Some(std::slice::from_ref(import)),
                entry_filename: Some(filename.as_str()),
            },
        )
        .await?;
        entries.push(EntryPoint {
            name: import.clone(),
            path,
        });
    }
    Ok(entries)
}

/// Build `name` once from `install_path`.
pub async fn build_package(
    compiler: &dyn Compiler,
    name: &str,
    install_path: &Path,
    externals: &Externals,
    options: &BuildOptions,
) -> Result<BuildResult> {
    let entries = write_entries(name, install_path, options).await?;
    if entries.is_empty() {
        return Ok(BuildResult::default());
    }

    let config = make_config(
        name,
        install_path,
        entries,
        externals,
        options.minifier,
        options.debug,
    )?;

    tracing::debug!(package = name, entries = config.entries.len(), "Build start");
    let compile_started = Instant::now();
    let output = compiler.compile(&config).await;
    let crash = output.crash.as_ref().map(classify::crash_error);
    telemetry::record(Phase::PackageCompile, name, compile_started, crash.as_ref());
    tracing::debug!(package = name, "Build end");

    let parse_started = Instant::now();
    let classified = classify::classify(name, &output);
    telemetry::record(
        Phase::ParseBundlerStats,
        name,
        parse_started,
        match &classified {
            Err(err @ Error::UnexpectedBuild { .. }) => Some(err),
            _ => None,
        },
    );
    classified?;

    // Classification guarantees stats from here on.
    let Some(stats) = output.stats else {
        return Err(Error::unexpected_build("Bundler stats disappeared after classification"));
    };

    let assets_started = Instant::now();
    let assets = assets::asset_stats(&stats, &output.files, options.calc_parse).await;
    let assets = telemetry::observe(Phase::AssetsGzipParseTime, name, assets_started, assets)?;
    tracing::debug!(package = name, assets = ?assets, "Build result");

    let dependency_sizes = if options.include_dependency_sizes {
        Some(bundle_size_tree(name, &stats, options.minifier).await?)
    } else {
        None
    };

    Ok(BuildResult {
        assets,
        dependency_sizes,
        ignored_missing_dependencies: None,
    })
}

/// Whether a failed build may be retried with its missing modules
/// externalized.
fn retryable_missing_modules(err: &Error) -> Option<&[String]> {
    err.missing_modules().filter(|missing| {
        missing.len() <= MAX_IGNORED_MISSING_DEPENDENCIES
            && missing.iter().all(|name| is_valid_package_name(name))
    })
}

/// Build `name`, retrying once with missing dependencies treated as
/// externals.
///
/// Only a missing-dependency failure naming at most
/// [`MAX_IGNORED_MISSING_DEPENDENCIES`] valid package names is retried. A
/// failure of the retry propagates unchanged.
pub async fn build_package_ignoring_missing_deps(
    compiler: &dyn Compiler,
    name: &str,
    install_path: &Path,
    mut externals: Externals,
    options: &BuildOptions,
) -> Result<BuildResult> {
    let started = Instant::now();

    let first = build_package(compiler, name, install_path, &externals, options).await;
    let err = match first {
        Ok(result) => {
            telemetry::record(Phase::PackageBuild, name, started, None);
            return Ok(result);
        }
        Err(err) => err,
    };

    let Some(missing) = retryable_missing_modules(&err).map(<[String]>::to_vec) else {
        telemetry::record(Phase::PackageBuild, name, started, Some(&err));
        return Err(err);
    };

    tracing::info!(
        package = name,
        missing = ?missing,
        "Package has missing dependencies, rebuilding without them"
    );
    externals.extend_packages(missing.iter().cloned());

    let rebuilt = build_package(compiler, name, install_path, &externals, options)
        .await
        .map(|result| BuildResult {
            ignored_missing_dependencies: Some(missing),
            ..result
        });
    telemetry::observe(Phase::PackageBuild, name, started, rebuilt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_gate() {
        let small = Error::missing_dependency("x", vec!["left-pad".into(), "@s/p".into()]);
        assert_eq!(retryable_missing_modules(&small).map(|m| m.len()), Some(2));

        let seven = Error::missing_dependency("x", (0..7).map(|i| format!("dep-{i}")).collect());
        assert!(retryable_missing_modules(&seven).is_none());

        let six = Error::missing_dependency("x", (0..6).map(|i| format!("dep-{i}")).collect());
        assert!(retryable_missing_modules(&six).is_some());

        let invalid = Error::missing_dependency("x", vec!["Bad Name".into()]);
        assert!(retryable_missing_modules(&invalid).is_none());

        assert!(retryable_missing_modules(&Error::build("x")).is_none());
    }

    #[test]
    fn test_build_result_serialization_skips_absent_fields() {
        let value = serde_json::to_value(BuildResult::default()).unwrap();
        assert_eq!(value, serde_json::json!({ "assets": [] }));
    }
}
