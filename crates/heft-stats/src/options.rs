//! Caller-facing options for the top-level operations.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::build::BuildOptions;
use crate::bundler::Minifier;
use crate::sandbox::{DEFAULT_INSTALL_TIMEOUT_MS, InstallClient, InstallOptions};

/// Options accepted by [`get_package_stats`](crate::get_package_stats) and
/// friends. Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsOptions {
    pub minifier: Minifier,
    pub client: InstallClient,
    /// Install timeout in milliseconds.
    pub install_timeout: u64,
    pub network_concurrency: Option<u32>,
    pub limit_concurrency: bool,
    pub custom_imports: Option<Vec<String>>,
    pub split_custom_imports: bool,
    pub include_dependency_sizes: bool,
    /// Measure cold parse time of JS assets.
    pub calc_parse: bool,
    /// Keep the sandbox and write emitted files to `<sandbox>/dist`.
    pub debug: bool,
    /// Root for sandboxes and package-manager caches; the system temp dir
    /// when unset.
    pub tmp_dir: Option<PathBuf>,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            minifier: Minifier::default(),
            client: InstallClient::default(),
            install_timeout: DEFAULT_INSTALL_TIMEOUT_MS,
            network_concurrency: None,
            limit_concurrency: false,
            custom_imports: None,
            split_custom_imports: false,
            include_dependency_sizes: true,
            calc_parse: false,
            debug: false,
            tmp_dir: None,
        }
    }
}

impl StatsOptions {
    pub fn install_options(&self) -> InstallOptions {
        InstallOptions {
            client: self.client,
            timeout: Duration::from_millis(self.install_timeout),
            network_concurrency: self.network_concurrency,
            limit_concurrency: self.limit_concurrency,
        }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            minifier: self.minifier,
            custom_imports: self.custom_imports.clone(),
            split_custom_imports: self.split_custom_imports,
            include_dependency_sizes: self.include_dependency_sizes,
            calc_parse: self.calc_parse,
            debug: self.debug,
        }
    }
}
