//! Isolated install directories.
//!
//! Each measurement gets its own directory with a throwaway `package.json`.
//! Registry packages are staged under a shared temp root; local packages are
//! staged inside the package itself so relative paths keep resolving. The
//! package manager caches live under `<root>/cache` and are shared across
//! sandboxes.

mod client;
mod process;

pub use client::{DEFAULT_INSTALL_TIMEOUT_MS, InstallClient, InstallOptions, pack_args};

use path_clean::PathClean;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::package::PackageIdentifier;
use crate::telemetry::{self, Phase};
use crate::{Error, Result};
use process::CommandFailure;

/// Browser targets written into every sandbox manifest.
pub const BROWSERSLIST: &[&str] = &[
    "last 5 Chrome versions",
    "last 5 Firefox versions",
    "Safari >= 9",
    "edge >= 12",
];

/// A prepared install directory owned by one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sandbox {
    install_path: PathBuf,
}

impl Sandbox {
    /// Wrap an existing directory, e.g. one populated by hand in tests.
    pub fn from_path(install_path: impl Into<PathBuf>) -> Self {
        Self {
            install_path: install_path.into(),
        }
    }

    pub fn install_path(&self) -> &Path {
        &self.install_path
    }

    /// `node_modules/<name>` inside the sandbox.
    pub fn package_dir(&self, package_name: &str) -> PathBuf {
        let mut dir = self.install_path.join("node_modules");
        for segment in package_name.split('/') {
            dir.push(segment);
        }
        dir
    }

    pub fn manifest_path(&self, package_name: &str) -> PathBuf {
        self.package_dir(package_name).join("package.json")
    }

    /// Directory debug builds write their output to.
    pub fn dist_dir(&self) -> PathBuf {
        self.install_path.join("dist")
    }
}

/// Creates, fills and removes sandboxes under a shared root.
#[derive(Debug, Clone)]
pub struct SandboxManager {
    root: PathBuf,
}

impl SandboxManager {
    /// `root` is lexically normalized; it does not need to exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into().clean(),
        }
    }

    /// Manager rooted at `<system temp>/heft`.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join("heft"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Create a fresh sandbox for `package`.
    pub async fn prepare(&self, package: &PackageIdentifier) -> Result<Sandbox> {
        let id = build_id(&package.name);
        let install_path = match (&package.local_path, package.is_local) {
            (Some(local), true) => local.join(id),
            _ => self.root.join("packages").join(id),
        };

        tokio::fs::create_dir_all(&install_path)
            .await
            .map_err(|e| setup_error(&install_path, e))?;

        let manifest = json!({
            "dependencies": {},
            "browserslist": BROWSERSLIST,
        });
        let contents = serde_json::to_string_pretty(&manifest)
            .map_err(|e| Error::install(format!("Failed to serialize sandbox manifest: {e}")))?;
        tokio::fs::write(install_path.join("package.json"), contents)
            .await
            .map_err(|e| setup_error(&install_path, e))?;

        tracing::debug!(package = %package, path = %install_path.display(), "Prepared sandbox");
        Ok(Sandbox { install_path })
    }

    /// Install `package` into `sandbox` with the configured client.
    pub async fn install(
        &self,
        package: &PackageIdentifier,
        sandbox: &Sandbox,
        options: &InstallOptions,
    ) -> Result<()> {
        let started = Instant::now();
        let result = self.install_inner(package, sandbox, options).await;
        telemetry::observe(Phase::PackageInstall, &package.name, started, result)
    }

    async fn install_inner(
        &self,
        package: &PackageIdentifier,
        sandbox: &Sandbox,
        options: &InstallOptions,
    ) -> Result<()> {
        let cwd = sandbox.install_path();

        let spec = match (&package.local_path, package.is_local) {
            (Some(local), true) => self.pack_local(local, cwd, options).await?,
            _ => package.install_spec(),
        };

        // Specs starting with '-' would be read as flags by the client.
        if spec.starts_with('-') {
            return Err(Error::install(format!(
                "Refusing to install '{spec}': package strings must not start with '-'"
            )));
        }

        let cache_root = self.cache_dir();
        tokio::fs::create_dir_all(&cache_root)
            .await
            .map_err(|e| setup_error(&cache_root, e))?;

        let args = options.client.install_args(&spec, &cache_root, options);
        let output = process::run(&options.client.program(), &args, cwd, options.timeout)
            .await
            .map_err(classify_install_failure)?;

        if !output.stderr.trim().is_empty() {
            tracing::debug!(client = %options.client, stderr = %output.stderr.trim(), "Install reported warnings");
        }
        tracing::info!(package = %package, client = %options.client, "Installed package");
        Ok(())
    }

    /// Pack a local package into the sandbox and return the tarball path.
    async fn pack_local(
        &self,
        package_dir: &Path,
        sandbox_dir: &Path,
        options: &InstallOptions,
    ) -> Result<String> {
        let args = pack_args(package_dir, sandbox_dir);
        let output = process::run(&client::executable("npm"), &args, sandbox_dir, options.timeout)
            .await
            .map_err(classify_install_failure)?;

        let tarball = output
            .stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .ok_or_else(|| Error::install("npm pack did not report a tarball name"))?;

        Ok(sandbox_dir.join(tarball).display().to_string())
    }

    /// Remove `sandbox` in the background. Failures are logged, never raised.
    pub fn cleanup(&self, sandbox: Sandbox) {
        let path = sandbox.install_path;
        let remove = async move {
            if let Err(err) = tokio::fs::remove_dir_all(&path).await {
                tracing::warn!(path = %path.display(), error = %err, "Failed to clean up sandbox");
            } else {
                tracing::debug!(path = %path.display(), "Removed sandbox");
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(remove);
            }
            Err(_) => tracing::warn!("No async runtime available; sandbox left in place"),
        }
    }
}

impl Default for SandboxManager {
    fn default() -> Self {
        Self::in_temp_dir()
    }
}

fn build_id(package_name: &str) -> String {
    let sanitized: String = package_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '-' })
        .collect();
    let unique = uuid::Uuid::new_v4().simple().to_string();
    format!("build-{}-{}", sanitized.trim_matches('-'), &unique[..12])
}

fn setup_error(path: &Path, err: std::io::Error) -> Error {
    Error::install(format!("Failed to prepare {}: {err}", path.display()))
}

fn classify_install_failure(failure: CommandFailure) -> Error {
    let text = failure.text();
    if is_not_found(&text) {
        Error::package_not_found(text)
    } else {
        Error::install(text)
    }
}

fn is_not_found(text: &str) -> bool {
    text.contains("code E404") || text.contains("ERR_PNPM_FETCH_404") || text.contains("404 Not Found")
}
