//! Top-level operations: measure a package, list its exports, size each
//! export.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::build::{BuildOptions, BuildResult, MAIN_ENTRY, ParseTime, build_package_ignoring_missing_deps};
use crate::bundler::{Compiler, RolldownCompiler};
use crate::exports::{ExportGraphResolver, ExportMap};
use crate::externals::compute_externals;
use crate::options::StatsOptions;
use crate::package::{ManifestDetails, PackageIdentifier};
use crate::sandbox::{Sandbox, SandboxManager};
use crate::telemetry::{self, Phase};
use crate::{Error, Result};

/// Measurements for a whole package.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageStats {
    #[serde(flatten)]
    pub details: ManifestDetails,
    #[serde(flatten)]
    pub build: BuildResult,
    /// Size of the main asset.
    pub size: usize,
    pub gzip: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse: Option<ParseTime>,
}

/// Runs the measurement pipeline with a given sandbox root, compiler and
/// export resolver.
#[derive(Clone)]
pub struct Engine {
    sandboxes: SandboxManager,
    compiler: Arc<dyn Compiler>,
    exports: ExportGraphResolver,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("sandboxes", &self.sandboxes)
            .field("exports", &self.exports)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(sandboxes: SandboxManager, compiler: Arc<dyn Compiler>) -> Self {
        Self {
            sandboxes,
            compiler,
            exports: ExportGraphResolver::default(),
        }
    }

    /// Engine with the rolldown compiler, rooted at `options.tmp_dir`.
    pub fn from_options(options: &StatsOptions) -> Self {
        let sandboxes = match &options.tmp_dir {
            Some(dir) => SandboxManager::new(dir.clone()),
            None => SandboxManager::in_temp_dir(),
        };
        Self::new(sandboxes, Arc::new(RolldownCompiler::new()))
    }

    pub fn with_export_resolver(mut self, exports: ExportGraphResolver) -> Self {
        self.exports = exports;
        self
    }

    async fn open(&self, raw: &str, options: &StatsOptions) -> Result<(PackageIdentifier, Sandbox)> {
        let package = PackageIdentifier::parse(raw)?;
        let sandbox = self.sandboxes.prepare(&package).await?;
        if options.debug {
            tracing::info!(path = %sandbox.install_path().display(), "Install path");
        }
        self.sandboxes
            .install(&package, &sandbox, &options.install_options())
            .await
            .inspect_err(|_| self.close(&sandbox, options))?;
        Ok((package, sandbox))
    }

    fn close(&self, sandbox: &Sandbox, options: &StatsOptions) {
        if !options.debug {
            self.sandboxes.cleanup(sandbox.clone());
        }
    }

    /// Install, build and measure `raw`.
    pub async fn package_stats(&self, raw: &str, options: &StatsOptions) -> Result<PackageStats> {
        let started = Instant::now();
        let result = async {
            let (package, sandbox) = self.open(raw, options).await?;
            let result = self.package_stats_in(&package, &sandbox, options).await;
            self.close(&sandbox, options);
            result
        }
        .await;
        telemetry::observe(Phase::PackageStats, raw, started, result)
    }

    async fn package_stats_in(
        &self,
        package: &PackageIdentifier,
        sandbox: &Sandbox,
        options: &StatsOptions,
    ) -> Result<PackageStats> {
        let manifest_path = manifest_path(package, sandbox);
        let externals = compute_externals(&package.name, &manifest_path).await?;

        let build_options = options.build_options();
        let (details, build) = futures::try_join!(
            ManifestDetails::read(&package.name, &manifest_path),
            build_package_ignoring_missing_deps(
                self.compiler.as_ref(),
                &package.name,
                sandbox.install_path(),
                externals,
                &build_options,
            ),
        )?;

        let has_css = build.assets.iter().any(|asset| asset.asset_type == "css");
        let main_type = if has_css { "css" } else { "js" };
        let main = build
            .assets
            .iter()
            .find(|asset| asset.name == MAIN_ENTRY && asset.asset_type == main_type)
            .ok_or_else(|| Error::unexpected_build("Did not find a main asset in the built bundle"))?;

        Ok(PackageStats {
            size: main.size,
            gzip: main.gzip,
            parse: main.parse,
            details,
            build,
        })
    }

    /// Install `raw` and map every export it exposes to its defining file.
    pub async fn all_package_exports(&self, raw: &str, options: &StatsOptions) -> Result<ExportMap> {
        let started = Instant::now();
        let result = async {
            let (package, sandbox) = self.open(raw, options).await?;
            let result = self.exports_in(&package, &sandbox).await;
            self.close(&sandbox, options);
            result
        }
        .await;
        telemetry::observe(Phase::PackageExports, raw, started, result)
    }

    async fn exports_in(&self, package: &PackageIdentifier, sandbox: &Sandbox) -> Result<ExportMap> {
        match (&package.local_path, package.is_local) {
            (Some(local), true) => self.exports.get_all_exports(&package.name, local, ".").await,
            _ => {
                self.exports
                    .get_all_exports(&package.name, sandbox.install_path(), &package.name)
                    .await
            }
        }
    }

    /// Build every named export of `raw` on its own and report one asset
    /// per export, annotated with the file that defines it.
    pub async fn package_export_sizes(
        &self,
        raw: &str,
        options: &StatsOptions,
    ) -> Result<BuildResult> {
        let started = Instant::now();
        let result = async {
            let (package, sandbox) = self.open(raw, options).await?;
            let result = self.export_sizes_in(&package, &sandbox, options).await;
            self.close(&sandbox, options);
            result
        }
        .await;
        telemetry::observe(Phase::PackageExportsSizes, raw, started, result)
    }

    async fn export_sizes_in(
        &self,
        package: &PackageIdentifier,
        sandbox: &Sandbox,
        options: &StatsOptions,
    ) -> Result<BuildResult> {
        let export_map = self.exports_in(package, sandbox).await?;
        let exports = importable_exports(&export_map);
        tracing::debug!(package = %package, exports = exports.len(), "Resolved exports");

        let externals = compute_externals(&package.name, &manifest_path(package, sandbox)).await?;
        let build_options = BuildOptions {
            custom_imports: Some(exports),
            split_custom_imports: true,
            include_dependency_sizes: false,
            ..options.build_options()
        };

        let mut result = build_package_ignoring_missing_deps(
            self.compiler.as_ref(),
            &package.name,
            sandbox.install_path(),
            externals,
            &build_options,
        )
        .await?;

        for asset in &mut result.assets {
            asset.path = export_map.get(&asset.name).cloned();
        }
        Ok(result)
    }
}

fn manifest_path(package: &PackageIdentifier, sandbox: &Sandbox) -> PathBuf {
    match (&package.local_path, package.is_local) {
        (Some(local), true) => local.join("package.json"),
        _ => sandbox.manifest_path(&package.name),
    }
}

/// Exports that can appear in `import { name }`: everything but `default`
/// and string-named exports.
pub(crate) fn importable_exports(export_map: &ExportMap) -> Vec<String> {
    export_map
        .keys()
        .filter(|name| name.as_str() != "default" && is_identifier(name))
        .cloned()
        .collect()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Measure `package` with the rolldown compiler.
pub async fn get_package_stats(package: &str, options: &StatsOptions) -> Result<PackageStats> {
    Engine::from_options(options).package_stats(package, options).await
}

/// Map every export of `package` to the file defining it.
pub async fn get_all_package_exports(package: &str, options: &StatsOptions) -> Result<ExportMap> {
    Engine::from_options(options)
        .all_package_exports(package, options)
        .await
}

/// Size every named export of `package` separately.
pub async fn get_package_export_sizes(
    package: &str,
    options: &StatsOptions,
) -> Result<BuildResult> {
    Engine::from_options(options)
        .package_export_sizes(package, options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{BundlerConfig, CompileOutput, OutputFiles, Stats, StatsAsset};
    use async_trait::async_trait;

    /// Emits `<entry>.bundle.<ext>` for every entry and extension.
    struct EchoCompiler {
        extensions: &'static [&'static str],
    }

    #[async_trait]
    impl Compiler for EchoCompiler {
        async fn compile(&self, config: &BundlerConfig) -> CompileOutput {
            let mut files = OutputFiles::default();
            let mut assets = Vec::new();
            for entry in &config.entries {
                for (i, ext) in self.extensions.iter().enumerate() {
                    let name = format!("{}.bundle.{ext}", entry.name);
                    let contents = "x".repeat(100 * (i + 1));
                    assets.push(StatsAsset {
                        name: name.clone(),
                        chunk_names: vec![entry.name.clone()],
                        size: contents.len(),
                    });
                    files.insert(name, contents);
                }
            }
            CompileOutput {
                stats: Some(Stats {
                    assets,
                    ..Default::default()
                }),
                files,
                crash: None,
            }
        }
    }

    fn engine(extensions: &'static [&'static str]) -> Engine {
        Engine::new(
            SandboxManager::in_temp_dir(),
            Arc::new(EchoCompiler { extensions }),
        )
    }

    #[allow(clippy::disallowed_methods)]
    fn installed(files: &[(&str, &str)]) -> (tempfile::TempDir, Sandbox, PackageIdentifier) {
        let dir = tempfile::TempDir::new().unwrap();
        for (relative, contents) in files {
            let path = dir.path().join("node_modules/widget").join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
        let sandbox = Sandbox::from_path(dir.path());
        (dir, sandbox, PackageIdentifier::parse_registry("widget@2.0.0"))
    }

    #[tokio::test]
    async fn test_package_stats_reports_main_asset_and_manifest() {
        let (_dir, sandbox, package) = installed(&[(
            "package.json",
            r#"{"name":"widget","version":"2.0.0","dependencies":{"a":"1"}}"#,
        )]);

        let stats = engine(&["js"])
            .package_stats_in(&package, &sandbox, &StatsOptions::default())
            .await
            .unwrap();

        assert_eq!(stats.size, 100);
        assert!(stats.gzip > 0);
        assert_eq!(stats.details.dependency_count, 1);
        assert_eq!(stats.details.version.as_deref(), Some("2.0.0"));
        assert_eq!(stats.build.dependency_sizes, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_package_stats_prefers_css_main_asset() {
        let (_dir, sandbox, package) = installed(&[("package.json", r#"{"name":"widget"}"#)]);

        let stats = engine(&["js", "css"])
            .package_stats_in(&package, &sandbox, &StatsOptions::default())
            .await
            .unwrap();

        // css asset is the second, 200 bytes long
        assert_eq!(stats.size, 200);
        assert_eq!(stats.build.assets.len(), 2);
    }

    #[tokio::test]
    async fn test_package_stats_without_main_asset_is_unexpected() {
        let (_dir, sandbox, package) = installed(&[("package.json", r#"{"name":"widget"}"#)]);

        let err = engine(&[])
            .package_stats_in(&package, &sandbox, &StatsOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.name(), "UnexpectedBuildError");
    }

    #[tokio::test]
    async fn test_export_sizes_annotate_paths() {
        let (_dir, sandbox, package) = installed(&[
            ("package.json", r#"{"name":"widget","main":"index.js"}"#),
            (
                "index.js",
                "export * from './math';\nexport default function widget() {}",
            ),
            ("math.js", "export const add = 1;\nexport function sub() {}"),
        ]);

        let result = engine(&["js"])
            .export_sizes_in(&package, &sandbox, &StatsOptions::default())
            .await
            .unwrap();

        let mut sized: Vec<(&str, Option<&str>)> = result
            .assets
            .iter()
            .map(|a| (a.name.as_str(), a.path.as_deref()))
            .collect();
        sized.sort_unstable();
        assert_eq!(
            sized,
            vec![
                ("add", Some("node_modules/widget/math.js")),
                ("sub", Some("node_modules/widget/math.js")),
            ]
        );
        assert!(result.dependency_sizes.is_none());
    }

    #[test]
    fn test_importable_exports() {
        let map: ExportMap = [
            ("default", "index.js"),
            ("map", "map.js"),
            ("$select", "select.js"),
            ("string name", "x.js"),
            ("_private", "p.js"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(importable_exports(&map), vec!["$select", "_private", "map"]);
    }
}
