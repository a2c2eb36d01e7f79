//! Package identifiers and manifest details.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::telemetry::{self, Phase};
use crate::{Error, Result};

/// A parsed package string: `name`, `name@version`, `@scope/name@version`,
/// or a filesystem path to a directory containing `package.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageIdentifier {
    pub name: String,
    pub version: Option<String>,
    pub scoped: bool,
    pub is_local: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl PackageIdentifier {
    /// Parse a raw package string.
    ///
    /// Local paths are recognized first (after `~` expansion); their name and
    /// version come from the directory's own manifest. Registry strings are
    /// split at the last `@`, where a leading `@` marks a scope rather than a
    /// version separator.
    #[allow(clippy::disallowed_methods)]
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::install("Invalid package string: empty"));
        }

        let expanded = expand_tilde(raw);
        let manifest_path = expanded.join("package.json");
        if manifest_path.is_file() {
            let contents = std::fs::read_to_string(&manifest_path).map_err(|e| {
                Error::install(format!("Failed to read {}: {e}", manifest_path.display()))
            })?;
            let manifest = PackageManifest::from_json(&contents, &manifest_path)?;
            let name = manifest.name.clone().ok_or_else(|| {
                Error::install(format!(
                    "Local package at {} has no \"name\" field",
                    expanded.display()
                ))
            })?;

            return Ok(Self {
                scoped: name.starts_with('@'),
                name,
                version: manifest.version,
                is_local: true,
                local_path: Some(expanded),
            });
        }

        Ok(Self::parse_registry(raw))
    }

    /// Parse a registry package string without touching the filesystem.
    pub fn parse_registry(raw: &str) -> Self {
        let scoped = raw.starts_with('@');
        let (name, version) = match raw.rfind('@') {
            Some(0) | None => (raw.to_string(), None),
            Some(at) => (raw[..at].to_string(), Some(raw[at + 1..].to_string())),
        };

        Self {
            name,
            version: version.filter(|v| !v.is_empty()),
            scoped,
            is_local: false,
            local_path: None,
        }
    }

    /// Argument handed to the package manager for registry installs.
    pub fn install_spec(&self) -> String {
        match &self.version {
            Some(version) => format!("{}@{}", self.name, version),
            None => self.name.clone(),
        }
    }
}

impl std::fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.local_path {
            Some(path) => write!(f, "{} ({})", self.name, path.display()),
            None => write!(f, "{}", self.install_spec()),
        }
    }
}

fn expand_tilde(raw: &str) -> PathBuf {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"));
    match (raw.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
            PathBuf::from(home).join(rest.trim_start_matches(['/', '\\']))
        }
        _ => PathBuf::from(raw),
    }
}

/// The subset of `package.json` the engine reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, Value>,
    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, Value>,
    #[serde(default, rename = "jsnext:main")]
    pub jsnext_main: Option<Value>,
    #[serde(default)]
    pub module: Option<Value>,
    #[serde(default, rename = "type")]
    pub module_type: Option<String>,
    #[serde(default)]
    pub side_effects: Option<SideEffects>,
}

impl PackageManifest {
    pub fn from_json(contents: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| Error::install(format!("Invalid manifest {}: {e}", path.display())))
    }

    /// Read a manifest from disk.
    pub async fn read(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::install(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_json(&contents, path)
    }

    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }

    pub fn peer_dependency_names(&self) -> impl Iterator<Item = &str> {
        self.peer_dependencies.keys().map(String::as_str)
    }
}

/// `sideEffects` is either a flag or a list of globs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SideEffects {
    Flag(bool),
    Patterns(Vec<String>),
}

impl Default for SideEffects {
    fn default() -> Self {
        SideEffects::Flag(true)
    }
}

/// Manifest-derived metadata merged into package stats.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDetails {
    pub dependency_count: usize,
    #[serde(rename = "hasJSNext")]
    pub has_js_next: bool,
    #[serde(rename = "hasJSModule")]
    pub has_js_module: bool,
    pub is_module_type: bool,
    pub has_side_effects: SideEffects,
    pub peer_dependencies: Vec<String>,
    pub name: Option<String>,
    pub version: Option<String>,
}

impl ManifestDetails {
    pub fn from_manifest(manifest: &PackageManifest) -> Self {
        let truthy = |value: &Option<Value>| match value {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };

        Self {
            dependency_count: manifest.dependencies.len(),
            has_js_next: truthy(&manifest.jsnext_main),
            has_js_module: truthy(&manifest.module),
            is_module_type: manifest.module_type.as_deref() == Some("module"),
            has_side_effects: manifest.side_effects.clone().unwrap_or_default(),
            peer_dependencies: manifest
                .peer_dependency_names()
                .map(str::to_string)
                .collect(),
            name: manifest.name.clone(),
            version: manifest.version.clone(),
        }
    }

    /// Read and summarize the manifest at `path`.
    pub async fn read(package_name: &str, path: &Path) -> Result<Self> {
        let started = Instant::now();
        match PackageManifest::read(path).await {
            Ok(manifest) => {
                telemetry::record(Phase::PackageJsonDetails, package_name, started, None);
                Ok(Self::from_manifest(&manifest))
            }
            Err(err) => {
                telemetry::record(Phase::PackageJsonDetails, package_name, started, Some(&err));
                Err(err)
            }
        }
    }
}
