//! Phase timing events.
//!
//! Every measured phase emits one `tracing` event under the
//! `heft::telemetry` target. Install a subscriber filtering on that target to
//! collect them; without one, emission is a no-op.

use std::time::Instant;

use crate::Error;

/// Target used for every telemetry event.
pub const TARGET: &str = "heft::telemetry";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PackageInstall,
    PackageJsonDetails,
    PackageBuild,
    PackageCompile,
    PackageStats,
    ParseBundlerStats,
    DependencySizes,
    AssetsGzipParseTime,
    ExportsTreewalk,
    PackageExports,
    PackageExportsSizes,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::PackageInstall => "package_install",
            Phase::PackageJsonDetails => "package_json_details",
            Phase::PackageBuild => "package_build",
            Phase::PackageCompile => "package_compile",
            Phase::PackageStats => "package_stats",
            Phase::ParseBundlerStats => "parse_bundler_stats",
            Phase::DependencySizes => "dependency_sizes",
            Phase::AssetsGzipParseTime => "assets_gzip_parse_time",
            Phase::ExportsTreewalk => "exports_treewalk",
            Phase::PackageExports => "package_exports",
            Phase::PackageExportsSizes => "package_exports_sizes",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emit the end-of-phase event for `package`.
pub fn record(phase: Phase, package: &str, started: Instant, error: Option<&Error>) {
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    match error {
        None => tracing::info!(
            target: TARGET,
            event = phase.as_str(),
            package,
            duration_ms,
            success = true,
        ),
        Some(err) => tracing::info!(
            target: TARGET,
            event = phase.as_str(),
            package,
            duration_ms,
            success = false,
            error = err.name(),
        ),
    }
}

/// Record the outcome of a fallible phase and pass the result through.
pub fn observe<T>(
    phase: Phase,
    package: &str,
    started: Instant,
    result: crate::Result<T>,
) -> crate::Result<T> {
    record(phase, package, started, result.as_ref().err());
    result
}
