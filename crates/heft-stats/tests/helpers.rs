//! Shared test utilities for heft-stats tests

#![allow(dead_code)]

use async_trait::async_trait;
use heft_stats::{
    BundlerConfig, CompileOutput, Compiler, OutputFiles, Stats, StatsAsset, StatsError,
    StatsModule,
};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// A compiler that replays canned outputs and records every config it saw.
#[derive(Default)]
pub struct ScriptedCompiler {
    outputs: Mutex<VecDeque<CompileOutput>>,
    configs: Mutex<Vec<BundlerConfig>>,
}

impl ScriptedCompiler {
    pub fn new(outputs: impl IntoIterator<Item = CompileOutput>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into_iter().collect()),
            configs: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.configs.lock().unwrap().len()
    }

    pub fn configs(&self) -> Vec<BundlerConfig> {
        self.configs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Compiler for ScriptedCompiler {
    async fn compile(&self, config: &BundlerConfig) -> CompileOutput {
        self.configs.lock().unwrap().push(config.clone());
        self.outputs
            .lock()
            .unwrap()
            .pop_front()
            .expect("compiler called more often than scripted")
    }
}

/// A successful compile emitting `<entry>.bundle.js` for every entry.
pub fn successful_output(entries: &[&str], modules: Vec<StatsModule>) -> CompileOutput {
    let mut files = OutputFiles::default();
    let mut assets = Vec::new();
    for entry in entries {
        let name = format!("{entry}.bundle.js");
        let code = format!("console.log({entry:?});").repeat(20);
        assets.push(StatsAsset {
            name: name.clone(),
            chunk_names: vec![entry.to_string()],
            size: code.len(),
        });
        files.insert(name, code);
    }

    CompileOutput {
        stats: Some(Stats {
            errors: Vec::new(),
            assets,
            modules,
        }),
        files,
        crash: None,
    }
}

/// A compile that failed to resolve `specifiers`.
pub fn missing_output(specifiers: &[&str]) -> CompileOutput {
    CompileOutput {
        stats: Some(Stats {
            errors: specifiers
                .iter()
                .map(|s| StatsError::module_not_found(s, "/sandbox"))
                .collect(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Write `files` (relative path, contents) under `root`.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (relative, contents) in files {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

/// A sandbox-like directory with `node_modules/<name>` populated.
pub fn project_with_package(name: &str, files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let prefixed: Vec<(String, &str)> = files
        .iter()
        .map(|(path, contents)| (format!("node_modules/{name}/{path}"), *contents))
        .collect();
    let borrowed: Vec<(&str, &str)> = prefixed.iter().map(|(p, c)| (p.as_str(), *c)).collect();
    write_files(dir.path(), &borrowed);
    dir
}
