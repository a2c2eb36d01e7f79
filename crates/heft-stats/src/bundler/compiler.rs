//! The compiler seam and its rolldown implementation.

use async_trait::async_trait;
use regex::Regex;
use rolldown::{
    BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, InputItem, OutputFormat, Platform,
};
use rolldown_common::{Output, StrOrBytes};
use rustc_hash::FxHashSet;
use std::sync::{Arc, LazyLock};

use super::plugins::{
    CollectedState, ExternalsPlugin, ModuleCollectionPlugin, PluginRegistry, SharedState,
    SourceRewritePlugin, StylesheetPlugin,
};
use super::{
    BUNDLE_INFIX, BundlerConfig, CompileCrash, CompileOutput, EntryPoint, Loader,
    OutputFiles, Stats, StatsAsset, StatsError, StatsModule, minify_js,
};

/// Produces stats and output files for a bundler configuration.
///
/// Implementations never fail: problems are reported through
/// [`CompileOutput::crash`] or as errors inside the stats.
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, config: &BundlerConfig) -> CompileOutput;
}

/// Bundles each entry with rolldown, in parallel.
#[derive(Debug, Clone, Default)]
pub struct RolldownCompiler {
    max_parallel: Option<usize>,
}

impl RolldownCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap concurrent entry bundles (defaults to `min(cpus, 8)`).
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = Some(max_parallel.max(1));
        self
    }
}

#[async_trait]
impl Compiler for RolldownCompiler {
    async fn compile(&self, config: &BundlerConfig) -> CompileOutput {
        let config = Arc::new(config.clone());
        let max_parallel = self
            .max_parallel
            .unwrap_or_else(|| num_cpus::get().min(8));

        let outcomes = bundle_entries_concurrent(Arc::clone(&config), max_parallel).await;

        let mut bundles = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                EntryOutcome::Bundled(bundle) => bundles.push(bundle),
                EntryOutcome::Crashed(crash) => return CompileOutput::crashed(crash),
            }
        }
        let (stats, files) = merge_bundles(bundles);

        if let Some(dir) = &config.output_dir {
            write_debug_output(dir, &files).await;
        }

        CompileOutput {
            stats: Some(stats),
            files,
            crash: None,
        }
    }
}

struct EntryBundle {
    stats: Stats,
    files: OutputFiles,
}

/// Combine per-entry results. The first entry to emit a name owns it, in
/// the asset list and the file map alike.
fn merge_bundles(bundles: Vec<EntryBundle>) -> (Stats, OutputFiles) {
    let mut stats = Stats::default();
    let mut files = OutputFiles::default();
    let mut seen_assets = FxHashSet::default();
    let mut seen_modules = FxHashSet::default();

    for bundle in bundles {
        stats.errors.extend(bundle.stats.errors);
        for asset in bundle.stats.assets {
            if seen_assets.insert(asset.name.clone()) {
                stats.assets.push(asset);
            }
        }
        for module in bundle.stats.modules {
            if seen_modules.insert(module.name.clone()) {
                stats.modules.push(module);
            }
        }
        files.merge(bundle.files);
    }
    (stats, files)
}

enum EntryOutcome {
    Bundled(EntryBundle),
    Crashed(CompileCrash),
}

/// Bundle every entry using `JoinSet` with a `Semaphore` for bounded
/// parallelism. Results come back in entry order.
async fn bundle_entries_concurrent(
    config: Arc<BundlerConfig>,
    max_parallel: usize,
) -> Vec<EntryOutcome> {
    use tokio::sync::Semaphore;
    use tokio::task::JoinSet;

    let mut join_set = JoinSet::new();
    let semaphore = Arc::new(Semaphore::new(max_parallel));

    for (index, entry) in config.entries.iter().cloned().enumerate() {
        let config = Arc::clone(&config);
        let permit = Arc::clone(&semaphore);

        join_set.spawn(async move {
            let outcome = match permit.acquire().await {
                Ok(_permit) => bundle_entry(config, entry).await,
                Err(_) => EntryOutcome::Crashed(CompileCrash::Failed(
                    "build scheduler closed unexpectedly".to_string(),
                )),
            };
            (index, outcome)
        });
    }

    let mut results = Vec::with_capacity(config.entries.len());
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(join_err) => results.push((
                usize::MAX,
                EntryOutcome::Crashed(CompileCrash::Failed(format!(
                    "Build task panicked: {join_err}"
                ))),
            )),
        }
    }

    // Merge in original order for determinism
    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, outcome)| outcome).collect()
}

async fn bundle_entry(config: Arc<BundlerConfig>, entry: EntryPoint) -> EntryOutcome {
    let state = SharedState::default();

    let mut registry = PluginRegistry::new();
    registry.add(Arc::new(ExternalsPlugin::new(Arc::clone(&config))));
    registry.add(Arc::new(SourceRewritePlugin::new(
        config.has_loader(Loader::Shebang),
        config.has_loader(Loader::LicenseComment),
    )));
    registry.add(Arc::new(StylesheetPlugin::new(
        SharedState::clone(&state),
        config.has_loader(Loader::Stylesheet),
        config.has_loader(Loader::StaticFile),
    )));
    registry.add(Arc::new(ModuleCollectionPlugin::new(SharedState::clone(
        &state,
    ))));
    tracing::debug!(entry = %entry.name, plugins = registry.len(), "Bundling entry");

    let options = BundlerOptions {
        input: Some(vec![InputItem {
            name: Some(entry.name.clone()),
            import: entry.path.to_string_lossy().to_string(),
        }]),
        cwd: Some(config.context.clone()),
        format: Some(OutputFormat::Cjs),
        platform: Some(Platform::Browser),
        resolve: Some(config.resolution.to_rolldown()),
        ..Default::default()
    };

    let mut bundler = match RolldownBundlerBuilder::default()
        .with_options(options)
        .with_plugins(registry.into_rolldown_plugins())
        .build()
    {
        Ok(bundler) => bundler,
        Err(e) => return EntryOutcome::Crashed(CompileCrash::RejectedOptions(format!("{e:?}"))),
    };

    let generated = bundler.generate().await;
    let collected = std::mem::take(&mut *state.lock());
    let mut stats = Stats {
        modules: collected_modules(&collected),
        ..Default::default()
    };
    let mut files = OutputFiles::default();
    let context = config.context.display().to_string();

    let bundle = match generated {
        Ok(bundle) => bundle,
        Err(e) => {
            stats.errors = errors_from_diagnostic(&format!("{e:?}"), &context);
            return EntryOutcome::Bundled(EntryBundle { stats, files });
        }
    };

    for warning in &bundle.warnings {
        let text = format!("{warning:?}");
        for specifier in unresolved_specifiers(&text) {
            stats
                .errors
                .push(StatsError::module_not_found(&specifier, &context));
        }
    }

    for output in bundle.assets.iter() {
        match output {
            Output::Chunk(chunk) => {
                let name = format!("{}{BUNDLE_INFIX}js", chunk.name);
                // Chunks go through the same minifier dependency sizes use.
                let code = match minify_js(&chunk.code, config.minifier) {
                    Ok(code) => code,
                    Err(failure) => {
                        stats.errors.push(StatsError::other(format!(
                            "{name} from minifier: {failure}"
                        )));
                        chunk.code.clone()
                    }
                };
                stats.assets.push(StatsAsset {
                    name: name.clone(),
                    chunk_names: vec![chunk.name.to_string()],
                    size: code.len(),
                });
                files.insert(name, code);
            }
            Output::Asset(asset) => {
                let bytes = match &asset.source {
                    StrOrBytes::Str(s) => s.as_bytes().to_vec(),
                    StrOrBytes::Bytes(b) => b.clone(),
                };
                stats.assets.push(StatsAsset {
                    name: asset.filename.to_string(),
                    chunk_names: Vec::new(),
                    size: bytes.len(),
                });
                files.insert(asset.filename.to_string(), bytes);
            }
        }
    }

    if !collected.stylesheets.is_empty() {
        let css = collected
            .stylesheets
            .iter()
            .map(|sheet| sheet.css.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let name = format!("{}{BUNDLE_INFIX}css", entry.name);
        stats.assets.push(StatsAsset {
            name: name.clone(),
            chunk_names: vec![entry.name.clone()],
            size: css.len(),
        });
        files.insert(name, css);
    }

    for file in collected.static_files {
        stats.assets.push(StatsAsset {
            name: file.name.clone(),
            chunk_names: vec![entry.name.clone()],
            size: file.contents.len(),
        });
        files.insert(file.name, file.contents);
    }

    EntryOutcome::Bundled(EntryBundle { stats, files })
}

fn collected_modules(collected: &CollectedState) -> Vec<StatsModule> {
    collected
        .modules
        .iter()
        .map(|(id, code)| StatsModule::new(id.as_str(), code.as_str()))
        .chain(
            collected
                .stylesheets
                .iter()
                .map(|sheet| StatsModule::new(sheet.id.as_str(), sheet.source.as_str())),
        )
        .collect()
}

static UNRESOLVED_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:Could not resolve|Can't resolve|Cannot resolve|Cannot find module) \\?['"]([^'"\\]+)\\?['"]|specifier: \\?"([^"\\]+)\\?""#,
    )
    .expect("unresolved-import pattern is valid")
});

/// Specifiers a bundler diagnostic reports as unresolvable, deduplicated in
/// order of appearance.
pub(crate) fn unresolved_specifiers(text: &str) -> Vec<String> {
    let mut seen = FxHashSet::default();
    UNRESOLVED_IMPORT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .filter(|specifier| seen.insert(specifier.clone()))
        .collect()
}

/// Convert a failed bundle's diagnostic into stats errors.
///
/// Unresolved imports become module-not-found errors naming the
/// specifier; anything else is kept verbatim.
pub(crate) fn errors_from_diagnostic(text: &str, context: &str) -> Vec<StatsError> {
    let unresolved = unresolved_specifiers(text);
    if unresolved.is_empty() {
        return vec![StatsError::other(text)];
    }
    unresolved
        .iter()
        .map(|specifier| StatsError::module_not_found(specifier, context))
        .collect()
}

#[allow(clippy::disallowed_methods)]
async fn write_debug_output(dir: &std::path::Path, files: &OutputFiles) {
    if let Err(err) = tokio::fs::create_dir_all(dir).await {
        tracing::warn!(dir = %dir.display(), error = %err, "Failed to create debug output dir");
        return;
    }
    for (name, contents) in files.iter() {
        let path = dir.join(name);
        if let Err(err) = tokio::fs::write(&path, contents).await {
            tracing::warn!(path = %path.display(), error = %err, "Failed to write debug output");
        }
    }
    tracing::info!(dir = %dir.display(), files = files.len(), "Wrote debug output");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::StatsErrorKind;

    fn bundle_with(files: &[(&str, &str)]) -> EntryBundle {
        let mut bundle = EntryBundle {
            stats: Stats::default(),
            files: OutputFiles::default(),
        };
        for (name, contents) in files {
            bundle.stats.assets.push(StatsAsset {
                name: name.to_string(),
                chunk_names: Vec::new(),
                size: contents.len(),
            });
            bundle.files.insert(*name, *contents);
        }
        bundle
    }

    #[test]
    fn test_merged_assets_and_files_agree_on_clashes() {
        let (stats, files) = merge_bundles(vec![
            bundle_with(&[("map.bundle.js", "map"), ("logo.bundle.svg", "<svg/>")]),
            bundle_with(&[("filter.bundle.js", "filter"), ("logo.bundle.svg", "<svg>longer</svg>")]),
        ]);

        let names: Vec<&str> = stats.assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["map.bundle.js", "logo.bundle.svg", "filter.bundle.js"]);
        assert_eq!(files.len(), 3);
        for asset in &stats.assets {
            assert_eq!(files.get(&asset.name).map(<[u8]>::len), Some(asset.size), "{}", asset.name);
        }
        assert_eq!(files.get("logo.bundle.svg"), Some(&b"<svg/>"[..]));
    }

    #[test]
    fn test_unresolved_specifiers_from_messages() {
        let text = r#"BatchedBuildDiagnostic([BuildDiagnostic { message: "Could not resolve 'left-pad' in index.js" }, BuildDiagnostic { message: "Could not resolve 'left-pad' in lib.js" }, BuildDiagnostic { message: "Could not resolve '@scope/pkg/sub' in a.js" }])"#;
        assert_eq!(unresolved_specifiers(text), vec!["left-pad", "@scope/pkg/sub"]);
    }

    #[test]
    fn test_unresolved_specifiers_from_struct_fields() {
        let text = r#"UnresolvedImport { specifier: "react-dom", importer: "/sandbox/index.js" }"#;
        assert_eq!(unresolved_specifiers(text), vec!["react-dom"]);

        let escaped = r#"message: "Could not resolve \"lodash\"""#;
        assert_eq!(unresolved_specifiers(escaped), vec!["lodash"]);
    }

    #[test]
    fn test_errors_from_diagnostic() {
        let errors = errors_from_diagnostic("Could not resolve 'left-pad'", "/sandbox");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, StatsErrorKind::ModuleNotFound);
        assert_eq!(
            errors[0].message,
            "Module not found: Error: Can't resolve 'left-pad' in '/sandbox'"
        );

        let other = errors_from_diagnostic("Unexpected token", "/sandbox");
        assert_eq!(other, vec![StatsError::other("Unexpected token")]);
    }
}
