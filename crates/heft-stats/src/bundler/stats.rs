//! Compiler output in the shape the build pipeline consumes.

use rustc_hash::FxHashMap;
use serde::Serialize;

/// What a compile produced: stats, an in-memory output filesystem, or a
/// crash that prevented either from existing.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    pub stats: Option<Stats>,
    pub files: OutputFiles,
    pub crash: Option<CompileCrash>,
}

impl CompileOutput {
    pub fn crashed(crash: CompileCrash) -> Self {
        Self {
            stats: None,
            files: OutputFiles::default(),
            crash: Some(crash),
        }
    }
}

/// Compiler failures that happen before any stats exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileCrash {
    /// The bundler rejected the configuration.
    RejectedOptions(String),
    /// The bundler failed outright.
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub errors: Vec<StatsError>,
    pub assets: Vec<StatsAsset>,
    pub modules: Vec<StatsModule>,
}

impl Stats {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.assets.is_empty() && self.modules.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatsErrorKind {
    ModuleNotFound,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsError {
    pub kind: StatsErrorKind,
    pub message: String,
}

impl StatsError {
    pub fn module_not_found(specifier: &str, context: &str) -> Self {
        Self {
            kind: StatsErrorKind::ModuleNotFound,
            message: format!("Module not found: Error: Can't resolve '{specifier}' in '{context}'"),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: StatsErrorKind::Other,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsAsset {
    pub name: String,
    pub chunk_names: Vec<String>,
    pub size: usize,
}

/// A module in the bundle. Concatenated modules list their members in
/// `modules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsModule {
    pub name: String,
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<StatsModule>,
}

impl StatsModule {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: Some(source.into()),
            modules: Vec::new(),
        }
    }
}

/// Emitted files keyed by output name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputFiles {
    files: FxHashMap<String, Vec<u8>>,
}

impl OutputFiles {
    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), contents.into());
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Add `other`'s files, keeping the existing contents on a name clash.
    pub fn merge(&mut self, other: OutputFiles) {
        for (name, contents) in other.files {
            self.files.entry(name).or_insert(contents);
        }
    }
}
