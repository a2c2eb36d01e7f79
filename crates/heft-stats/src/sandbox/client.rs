//! Package manager clients and their install argument vectors.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default install timeout (60 seconds)
pub const DEFAULT_INSTALL_TIMEOUT_MS: u64 = 60_000;

/// Supported package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallClient {
    #[default]
    Npm,
    Yarn,
    Pnpm,
}

impl InstallClient {
    /// Get the name of this package manager for display
    pub fn name(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
        }
    }

    /// Executable to spawn. Windows ships the managers as `.cmd` shims.
    pub fn program(&self) -> String {
        executable(self.name())
    }

    /// Arguments for installing `spec` into the current directory.
    ///
    /// Scripts, lockfiles and optional dependencies are disabled and versions
    /// are pinned. Each manager keeps its cache under `cache_root` so
    /// concurrent installs share a content-addressed store.
    pub fn install_args(&self, spec: &str, cache_root: &Path, options: &InstallOptions) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        match self {
            Self::Npm => {
                args.push("install".into());
                args.push(spec.into());
                args.push(format!("--cache={}", cache_root.display()));
                args.extend(
                    [
                        "--no-package-lock",
                        "--no-shrinkwrap",
                        "--legacy-peer-deps",
                        "--no-optional",
                        "--no-bin-links",
                        "--progress=false",
                        "--loglevel=error",
                        "--ignore-scripts",
                        "--save-exact",
                        "--production",
                        "--json",
                    ]
                    .map(String::from),
                );
            }
            Self::Yarn => {
                args.push("add".into());
                args.push(spec.into());
                args.extend(
                    [
                        "--ignore-flags",
                        "--ignore-engines",
                        "--skip-integrity-check",
                        "--exact",
                        "--json",
                        "--no-progress",
                        "--silent",
                        "--no-lockfile",
                        "--no-bin-links",
                        "--no-audit",
                        "--no-fund",
                        "--ignore-optional",
                    ]
                    .map(String::from),
                );
                args.push("--cache-folder".into());
                args.push(cache_root.join("yarn").display().to_string());
                if options.limit_concurrency {
                    args.push("--mutex".into());
                    args.push("network".into());
                }
                if let Some(n) = options.network_concurrency {
                    args.push("--network-concurrency".into());
                    args.push(n.to_string());
                }
            }
            Self::Pnpm => {
                args.push("add".into());
                args.push(spec.into());
                args.extend(
                    [
                        "--no-optional",
                        "--loglevel=error",
                        "--ignore-scripts",
                        "--save-exact",
                    ]
                    .map(String::from),
                );
                args.push("--store-dir".into());
                args.push(cache_root.join("pnpm").display().to_string());
            }
        }
        args
    }
}

impl std::fmt::Display for InstallClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InstallClient {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "npm" => Ok(Self::Npm),
            "yarn" => Ok(Self::Yarn),
            "pnpm" => Ok(Self::Pnpm),
            other => Err(format!(
                "Unknown package manager '{other}'. Expected one of: npm, yarn, pnpm"
            )),
        }
    }
}

/// Arguments for packing a local package directory into `destination`.
pub fn pack_args(package_dir: &Path, destination: &Path) -> Vec<String> {
    vec![
        "pack".into(),
        "--ignore-scripts".into(),
        "--pack-destination".into(),
        destination.display().to_string(),
        package_dir.display().to_string(),
    ]
}

pub(crate) fn executable(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.cmd")
    } else {
        name.to_string()
    }
}

/// Install-time knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    pub client: InstallClient,
    pub timeout: Duration,
    pub network_concurrency: Option<u32>,
    pub limit_concurrency: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            client: InstallClient::default(),
            timeout: Duration::from_millis(DEFAULT_INSTALL_TIMEOUT_MS),
            network_concurrency: None,
            limit_concurrency: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cache() -> PathBuf {
        PathBuf::from("/tmp/heft/cache")
    }

    #[test]
    fn test_npm_install_args() {
        let args = InstallClient::Npm.install_args("react@18.2.0", &cache(), &InstallOptions::default());
        insta::assert_snapshot!(args.join(" "), @"install react@18.2.0 --cache=/tmp/heft/cache --no-package-lock --no-shrinkwrap --legacy-peer-deps --no-optional --no-bin-links --progress=false --loglevel=error --ignore-scripts --save-exact --production --json");
    }

    #[test]
    fn test_yarn_install_args_with_concurrency() {
        let options = InstallOptions {
            client: InstallClient::Yarn,
            network_concurrency: Some(4),
            limit_concurrency: true,
            ..Default::default()
        };
        let args = InstallClient::Yarn.install_args("lodash", &cache(), &options);
        insta::assert_snapshot!(args.join(" "), @"add lodash --ignore-flags --ignore-engines --skip-integrity-check --exact --json --no-progress --silent --no-lockfile --no-bin-links --no-audit --no-fund --ignore-optional --cache-folder /tmp/heft/cache/yarn --mutex network --network-concurrency 4");
    }

    #[test]
    fn test_yarn_install_args_without_concurrency() {
        let args = InstallClient::Yarn.install_args("lodash", &cache(), &InstallOptions::default());
        assert!(!args.contains(&"--mutex".to_string()));
        assert!(!args.contains(&"--network-concurrency".to_string()));
    }

    #[test]
    fn test_pnpm_install_args() {
        let args = InstallClient::Pnpm.install_args("@babel/core", &cache(), &InstallOptions::default());
        assert_eq!(
            args,
            vec![
                "add",
                "@babel/core",
                "--no-optional",
                "--loglevel=error",
                "--ignore-scripts",
                "--save-exact",
                "--store-dir",
                "/tmp/heft/cache/pnpm",
            ]
        );
    }

    #[test]
    fn test_pack_args() {
        let args = pack_args(Path::new("/work/pkg"), Path::new("/work/pkg/build-1"));
        assert_eq!(
            args,
            vec![
                "pack",
                "--ignore-scripts",
                "--pack-destination",
                "/work/pkg/build-1",
                "/work/pkg"
            ]
        );
    }

    #[test]
    fn test_client_name_and_parse() {
        assert_eq!(InstallClient::Npm.name(), "npm");
        assert_eq!(InstallClient::Yarn.name(), "yarn");
        assert_eq!(InstallClient::Pnpm.name(), "pnpm");
        assert_eq!("PNPM".parse::<InstallClient>(), Ok(InstallClient::Pnpm));
        assert!("bun".parse::<InstallClient>().is_err());
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(InstallOptions::default().timeout, Duration::from_millis(60_000));
    }
}
