//! Bundler configuration and the compiler seam.
//!
//! [`make_config`] turns declarative inputs (package, entries, externals,
//! minifier) into a [`BundlerConfig`]. A [`Compiler`] consumes it and
//! returns [`Stats`] plus the emitted files; [`RolldownCompiler`] is the
//! production implementation.

mod compiler;
pub mod minify;
mod plugins;
pub mod stats;

pub use compiler::{Compiler, RolldownCompiler};
pub use minify::{Minifier, MinifyFailure, minify_js, neutralize_license_comments};
pub use stats::{
    CompileCrash, CompileOutput, OutputFiles, Stats, StatsAsset, StatsError, StatsErrorKind,
    StatsModule,
};

use regex::Regex;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

use crate::externals::{Externals, NODE_BUILTINS};
use crate::{Error, Result};

/// Resolution extensions, in precedence order.
pub const RESOLVE_EXTENSIONS: &[&str] = &[
    ".web.mjs", ".mjs", ".web.js", ".js", ".json", ".css", ".sass", ".scss",
];

pub const MODULE_DIRECTORIES: &[&str] = &["node_modules"];

/// Manifest fields consulted for a package's entry, in precedence order.
pub const MAIN_FIELDS: &[&str] = &["browser", "module", "main", "style"];

pub const CONDITION_NAMES: &[&str] = &["browser", "import", "require", "module", "default"];

/// Modules that always resolve to an empty module.
pub const IGNORED_MODULES: &[&str] = &["electron"];

/// Built-in names that are never stubbed.
pub const PRESERVED_GLOBALS: &[&str] = &["setImmediate", "console", "process", "Buffer"];

pub const STYLESHEET_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less"];

pub const STATIC_FILE_EXTENSIONS: &[&str] = &[
    "woff", "woff2", "eot", "ttf", "svg", "png", "jpeg", "jpg", "gif", "webp",
];

/// Suffix every emitted file carries: `<name>.bundle.<ext>`.
pub const BUNDLE_INFIX: &str = ".bundle.";

/// Steps applied to module sources on their way into the bundle.
///
/// TypeScript and JSX are transpiled by rolldown itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    /// CSS/SCSS/SASS/LESS are extracted into `<entry>.bundle.css`.
    Stylesheet,
    /// Fonts and images are emitted as `<file>.bundle.<ext>`.
    StaticFile,
    /// Strips `#!` lines from CLI-style entry files.
    Shebang,
    /// Demotes license comments so the minifier may drop them.
    LicenseComment,
}

impl Loader {
    pub const ALL: [Loader; 4] = [
        Loader::Stylesheet,
        Loader::StaticFile,
        Loader::Shebang,
        Loader::LicenseComment,
    ];
}

/// A synthetic entry file and the name its output chunk takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub path: PathBuf,
}

/// Resolution settings shared by the bundler and the export graph walker,
/// so both agree on which file a specifier names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionConfig {
    pub extensions: Vec<String>,
    pub modules: Vec<String>,
    pub main_fields: Vec<String>,
    pub condition_names: Vec<String>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            extensions: RESOLVE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            modules: MODULE_DIRECTORIES.iter().map(|s| s.to_string()).collect(),
            main_fields: MAIN_FIELDS.iter().map(|s| s.to_string()).collect(),
            condition_names: CONDITION_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ResolutionConfig {
    pub fn to_rolldown(&self) -> rolldown::ResolveOptions {
        rolldown::ResolveOptions {
            main_fields: Some(self.main_fields.clone()),
            condition_names: Some(self.condition_names.clone()),
            extensions: Some(self.extensions.clone()),
            modules: Some(self.modules.clone()),
            symlinks: Some(true),
            ..Default::default()
        }
    }

    pub fn to_oxc(&self) -> oxc_resolver::ResolveOptions {
        oxc_resolver::ResolveOptions {
            main_fields: self.main_fields.clone(),
            condition_names: self.condition_names.clone(),
            extensions: self.extensions.clone(),
            modules: self.modules.clone(),
            symlinks: true,
            ..Default::default()
        }
    }
}

/// Decides which specifiers stay out of the bundle.
///
/// Packages match `^name$` or `^name/` through one compiled alternation, so
/// `dep` never matches `dep-similar`. Built-ins match exactly.
#[derive(Debug, Clone)]
pub struct ExternalsMatcher {
    packages: Option<Regex>,
    built_ins: FxHashSet<String>,
}

impl ExternalsMatcher {
    pub fn new(externals: &Externals) -> Result<Self> {
        let packages = if externals.external_packages.is_empty() {
            None
        } else {
            let alternation = externals
                .external_packages
                .iter()
                .map(|name| {
                    let escaped = regex::escape(name);
                    format!("^{escaped}$|^{escaped}/")
                })
                .collect::<Vec<_>>()
                .join("|");
            let pattern = Regex::new(&format!("(?:{alternation})")).map_err(|e| {
                Error::unexpected_build(format!("Invalid externals pattern: {e}"))
            })?;
            Some(pattern)
        };

        Ok(Self {
            packages,
            built_ins: externals.external_built_ins.iter().cloned().collect(),
        })
    }

    pub fn is_external(&self, specifier: &str) -> bool {
        self.built_ins.contains(specifier)
            || self
                .packages
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(specifier))
    }
}

/// How a bare specifier is treated by the bundler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleRule {
    /// Replaced with an empty module, never reported.
    Ignored,
    /// Left as an import in the output.
    External,
    /// A Node built-in replaced with an empty module.
    EmptyStub,
    /// Resolved and bundled normally.
    Bundle,
}

/// Everything a [`Compiler`] needs to build one package.
#[derive(Debug, Clone)]
pub struct BundlerConfig {
    pub package_name: String,
    /// Directory imports resolve from (the sandbox).
    pub context: PathBuf,
    pub entries: Vec<EntryPoint>,
    pub externals: ExternalsMatcher,
    pub builtin_stubs: FxHashSet<String>,
    pub ignored_modules: Vec<String>,
    pub minifier: Minifier,
    pub loaders: Vec<Loader>,
    pub resolution: ResolutionConfig,
    /// Set in debug mode; emitted files are also written here.
    pub output_dir: Option<PathBuf>,
}

impl BundlerConfig {
    pub fn rule_for(&self, specifier: &str) -> ModuleRule {
        if self.ignored_modules.iter().any(|m| m == specifier) {
            ModuleRule::Ignored
        } else if self.externals.is_external(specifier) {
            ModuleRule::External
        } else if self.builtin_stubs.contains(specifier) {
            ModuleRule::EmptyStub
        } else {
            ModuleRule::Bundle
        }
    }

    pub fn has_loader(&self, loader: Loader) -> bool {
        self.loaders.contains(&loader)
    }
}

/// Build the bundler configuration for one package.
pub fn make_config(
    package_name: &str,
    context: &Path,
    entries: Vec<EntryPoint>,
    externals: &Externals,
    minifier: Minifier,
    debug: bool,
) -> Result<BundlerConfig> {
    Ok(BundlerConfig {
        package_name: package_name.to_string(),
        context: context.to_path_buf(),
        entries,
        externals: ExternalsMatcher::new(externals)?,
        builtin_stubs: builtin_stubs(package_name),
        ignored_modules: IGNORED_MODULES.iter().map(|s| s.to_string()).collect(),
        minifier,
        loaders: Loader::ALL.to_vec(),
        resolution: ResolutionConfig::default(),
        output_dir: debug.then(|| context.join("dist")),
    })
}

/// Built-ins (and their `node:` aliases) replaced with empty modules.
///
/// Globals the browser runtime provides are left alone, as is a built-in
/// sharing the package's own name. A built-in the package depends on is
/// still stubbed: its shim never reaches the measured bundle.
fn builtin_stubs(package_name: &str) -> FxHashSet<String> {
    let mut stubs = FxHashSet::default();
    for builtin in NODE_BUILTINS {
        if PRESERVED_GLOBALS.contains(builtin) || *builtin == package_name {
            continue;
        }
        stubs.insert(builtin.to_string());
        stubs.insert(format!("node:{builtin}"));
    }
    stubs
}
