//! Per-dependency contribution sizes.
//!
//! Bundler modules are grouped by the package folder they live in, nested
//! the same way `node_modules` directories nest, and every top-level group
//! is measured as the minified size of all the sources it contains
//! (including the sources of packages nested inside it).

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Instant;

use crate::bundler::{Minifier, Stats, StatsModule, minify_js};
use crate::telemetry::{self, Phase};
use crate::{Error, Result};

/// Approximate minified contribution of one top-level dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySize {
    pub name: String,
    pub approximate_size: usize,
}

/// A module reduced to its on-disk path and measurable source.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceModule {
    path: String,
    source: String,
}

/// One package folder and everything under it.
#[derive(Debug, Default)]
struct PackageNode {
    package_name: String,
    modules: Vec<SourceModule>,
    children: Vec<PackageNode>,
}

impl PackageNode {
    /// Attribute `module` to every package along `chain`, creating nodes
    /// as needed.
    fn insert(&mut self, chain: &[String], module: &SourceModule) {
        let Some((head, rest)) = chain.split_first() else {
            return;
        };

        let index = match self.children.iter().position(|c| &c.package_name == head) {
            Some(index) => index,
            None => {
                self.children.push(PackageNode {
                    package_name: head.clone(),
                    ..Default::default()
                });
                self.children.len() - 1
            }
        };

        let child = &mut self.children[index];
        child.modules.push(module.clone());
        child.insert(rest, module);
    }
}

static NODE_MODULES_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/node_modules/(?:\.pnpm/[^/]+/node_modules/)?")
        .expect("node_modules boundary pattern is valid")
});

/// Strip a loader-chain prefix (`loader!loader!/path`).
fn module_path(identifier: &str) -> &str {
    match identifier.rfind('!') {
        Some(index) => &identifier[index + 1..],
        None => identifier,
    }
}

/// Source a minifier will accept. JSON documents are turned into an
/// assignment expression.
fn measurable_source(path: &str, source: &str) -> String {
    if path.ends_with(".json") && serde_json::from_str::<serde_json::Value>(source).is_ok() {
        format!("$a$={source}")
    } else {
        source.to_string()
    }
}

fn flatten_modules(stats: &Stats) -> Vec<SourceModule> {
    fn make(module: &StatsModule) -> SourceModule {
        let path = module_path(&module.name).replace('\\', "/");
        let source = module
            .source
            .as_deref()
            .map(|source| measurable_source(&path, source))
            .unwrap_or_default();
        SourceModule { path, source }
    }

    let mut modules: Vec<SourceModule> = stats
        .modules
        .iter()
        .filter(|module| !module.name.starts_with("external"))
        .flat_map(|module| {
            if module.modules.is_empty() {
                vec![make(module)]
            } else {
                module.modules.iter().map(make).collect()
            }
        })
        .collect();

    modules.sort_by(|a, b| a.path.cmp(&b.path));
    modules
}

/// Package names along a module path, outermost first.
///
/// `/sb/node_modules/a/node_modules/@s/b/index.js` yields `["a", "@s/b"]`.
/// Package-manager store indirection (`.pnpm/<id>/node_modules/`) is
/// skipped so the readable name is reported.
pub(crate) fn package_chain(path: &str) -> Vec<String> {
    let mut segments: Vec<&str> = NODE_MODULES_BOUNDARY.split(path).collect();
    if segments.len() < 2 {
        return Vec::new();
    }
    segments.remove(0);

    segments
        .iter()
        .enumerate()
        .filter_map(|(index, segment)| {
            let is_last = index + 1 == segments.len();
            let name = if is_last {
                package_name_prefix(segment)
            } else {
                Some(*segment)
            };
            name.filter(|n| !n.is_empty()).map(str::to_string)
        })
        .collect()
}

/// `@scope/pkg/lib/x.js` -> `@scope/pkg`, `pkg/lib/x.js` -> `pkg`.
fn package_name_prefix(segment: &str) -> Option<&str> {
    let mut parts = segment.splitn(3, '/');
    let first = parts.next()?;
    if first.starts_with('@') {
        let second = parts.next()?;
        Some(&segment[..first.len() + 1 + second.len()])
    } else {
        Some(first)
    }
}

/// UTF-8 length of a string, counted over its UTF-16 code units.
///
/// A surrogate pair is one 4-byte scalar; a lone surrogate counts as the 3
/// bytes of its replacement encoding.
pub fn utf8_byte_len(text: &str) -> usize {
    let mut units = text.encode_utf16().peekable();
    let mut len = 0;
    while let Some(unit) = units.next() {
        len += match unit {
            0..0x80 => 1,
            0x80..0x800 => 2,
            0xD800..0xDC00 if units.peek().is_some_and(|u| (0xDC00..0xE000).contains(u)) => {
                units.next();
                4
            }
            _ => 3,
        };
    }
    len
}

fn build_tree(modules: &[SourceModule]) -> PackageNode {
    let mut root = PackageNode {
        package_name: "<root>".to_string(),
        ..Default::default()
    };
    for module in modules {
        root.insert(&package_chain(&module.path), module);
    }
    root
}

/// Size a single top-level package.
fn measure(name: String, modules: Vec<SourceModule>, minifier: Minifier) -> Result<DependencySize> {
    let mut approximate_size = 0;
    for module in &modules {
        let minified = minify_js(&module.source, minifier).map_err(|failure| {
            Error::minify(failure.messages.clone(), failure.message(), Some(module.path.clone()))
        })?;
        approximate_size += utf8_byte_len(&minified);
    }
    Ok(DependencySize {
        name,
        approximate_size,
    })
}

/// Approximate minified size of every first-level dependency in `stats`.
pub async fn bundle_size_tree(
    package_name: &str,
    stats: &Stats,
    minifier: Minifier,
) -> Result<Vec<DependencySize>> {
    let started = Instant::now();
    let result = bundle_size_tree_inner(stats, minifier).await;
    telemetry::observe(Phase::DependencySizes, package_name, started, result)
}

async fn bundle_size_tree_inner(stats: &Stats, minifier: Minifier) -> Result<Vec<DependencySize>> {
    let modules = flatten_modules(stats);
    let tree = build_tree(&modules);

    let tasks = tree
        .children
        .into_iter()
        .filter_map(|node| {
            let modules: Vec<SourceModule> = node
                .modules
                .into_iter()
                .filter(|module| !module.source.is_empty())
                .collect();
            (!modules.is_empty()).then_some((node.package_name, modules))
        })
        .map(|(name, modules)| {
            tokio::task::spawn_blocking(move || measure(name, modules, minifier))
        })
        .collect::<Vec<_>>();

    let mut sizes = Vec::with_capacity(tasks.len());
    for joined in futures::future::join_all(tasks).await {
        let size = joined
            .map_err(|e| Error::unexpected_build(format!("Dependency size task failed: {e}")))??;
        sizes.push(size);
    }
    Ok(sizes)
}
