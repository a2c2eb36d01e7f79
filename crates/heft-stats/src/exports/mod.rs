//! Whole-package export discovery.
//!
//! Starting from a package's entry module, every `export * from` edge is
//! resolved with the same rules the bundler uses and followed, producing a
//! map from exported name to the file that defines it.

mod parse;

pub use parse::{ExportDetails, get_exports_details};

use futures::future::{BoxFuture, FutureExt, try_join_all};
use oxc_resolver::Resolver;
use oxc_span::SourceType;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::bundler::ResolutionConfig;
use crate::telemetry::{self, Phase};
use crate::{Error, Result};

/// Exported name -> defining file, relative to the resolution context.
pub type ExportMap = BTreeMap<String, String>;

/// Follows `export *` chains through an owned module resolver.
#[derive(Clone)]
pub struct ExportGraphResolver {
    resolver: Arc<Resolver>,
}

impl std::fmt::Debug for ExportGraphResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportGraphResolver").finish_non_exhaustive()
    }
}

impl Default for ExportGraphResolver {
    fn default() -> Self {
        Self::new(&ResolutionConfig::default())
    }
}

impl ExportGraphResolver {
    /// Resolver using the bundler's resolution settings.
    pub fn new(config: &ResolutionConfig) -> Self {
        Self::with_resolver(Resolver::new(config.to_oxc()))
    }

    pub fn with_resolver(resolver: Resolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Every export reachable from `lookup_path`, resolved from `context`.
    pub async fn get_all_exports(
        &self,
        package: &str,
        context: &Path,
        lookup_path: &str,
    ) -> Result<ExportMap> {
        let started = Instant::now();
        let context = tokio::fs::canonicalize(context)
            .await
            .unwrap_or_else(|_| context.to_path_buf());
        let result = self
            .walk(&context, context.clone(), lookup_path.to_string(), Vec::new())
            .await;
        telemetry::observe(Phase::ExportsTreewalk, package, started, result)
    }

    /// One step of the walk. `ancestors` is the chain of files that led
    /// here; meeting one of them again is a cycle.
    fn walk<'a>(
        &'a self,
        root: &'a Path,
        dir: PathBuf,
        specifier: String,
        ancestors: Vec<PathBuf>,
    ) -> BoxFuture<'a, Result<ExportMap>> {
        async move {
            let resolved = self.resolve(&dir, &specifier)?;

            if ancestors.contains(&resolved) {
                let chain = ancestors
                    .iter()
                    .chain(std::iter::once(&resolved))
                    .map(|p| relative_to(root, p))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(Error::build(format!("Circular `export *` chain: {chain}")));
            }

            let code = tokio::fs::read_to_string(&resolved).await.map_err(|e| {
                Error::build(format!("Failed to read {}: {e}", resolved.display()))
            })?;
            let source_type = SourceType::from_path(&resolved).unwrap_or_else(|_| SourceType::mjs());
            let details = get_exports_details(&code, source_type).map_err(|message| {
                Error::build(format!("Failed to parse {}: {message}", resolved.display()))
            })?;

            let relative = relative_to(root, &resolved);
            let mut exports: ExportMap = details
                .exports
                .into_iter()
                .map(|name| (name, relative.clone()))
                .collect();

            let parent = resolved.parent().map(Path::to_path_buf).unwrap_or_default();
            let mut chain = ancestors;
            chain.push(resolved.clone());

            // Siblings resolve concurrently; merging follows declaration
            // order so later `export *` statements win.
            let children = details.export_all_locations.into_iter().map(|location| {
                self.walk(root, parent.clone(), location, chain.clone())
            });
            for child in try_join_all(children).await? {
                exports.extend(child);
            }

            Ok(exports)
        }
        .boxed()
    }

    fn resolve(&self, dir: &Path, specifier: &str) -> Result<PathBuf> {
        self.resolver
            .resolve(dir, specifier)
            .map(|resolution| resolution.path().to_path_buf())
            .map_err(|e| {
                Error::build(format!(
                    "Can't resolve '{specifier}' in '{}': {e}",
                    dir.display()
                ))
            })
    }
}

fn relative_to(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("/sb"), Path::new("/sb/node_modules/a/index.js")),
            "node_modules/a/index.js"
        );
        assert_eq!(relative_to(Path::new("/other"), Path::new("/sb/x.js")), "/sb/x.js");
    }
}
