//! Layered configuration.
//!
//! Priority: CLI flags > `HEFT_*` environment variables > config file >
//! built-in defaults. The config file is `heft.config.json` in the working
//! directory unless `--config` names another one.

mod loading;
mod tests;

use heft_stats::{InstallClient, Minifier, StatsOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

pub use loading::{CONFIG_FILE_NAME, CliOverrides, ENV_PREFIX};

/// Contents of `heft.config.json`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct HeftConfig {
    pub client: InstallClient,
    pub minifier: Minifier,
    /// Install timeout in milliseconds.
    pub install_timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_concurrency: Option<u32>,
    pub limit_concurrency: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_imports: Option<Vec<String>>,
    pub split_custom_imports: bool,
    pub include_dependency_sizes: bool,
    pub calc_parse: bool,
    pub debug: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmp_dir: Option<PathBuf>,
}

impl Default for HeftConfig {
    fn default() -> Self {
        let defaults = StatsOptions::default();
        Self {
            client: defaults.client,
            minifier: defaults.minifier,
            install_timeout: defaults.install_timeout,
            network_concurrency: defaults.network_concurrency,
            limit_concurrency: defaults.limit_concurrency,
            custom_imports: defaults.custom_imports,
            split_custom_imports: defaults.split_custom_imports,
            include_dependency_sizes: defaults.include_dependency_sizes,
            calc_parse: defaults.calc_parse,
            debug: defaults.debug,
            tmp_dir: defaults.tmp_dir,
        }
    }
}

impl HeftConfig {
    /// Reject values that parse but cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.install_timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "installTimeout".into(),
                value: "0".into(),
                hint: "Use a positive number of milliseconds".into(),
            }
            .into());
        }

        if self.network_concurrency == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "networkConcurrency".into(),
                value: "0".into(),
                hint: "Use at least 1, or leave it unset".into(),
            }
            .into());
        }

        if let Some(name) = self
            .custom_imports
            .iter()
            .flatten()
            .find(|name| crate::cli::parse_import_name(name).is_err())
        {
            return Err(ConfigError::InvalidValue {
                field: "customImports".into(),
                value: name.clone(),
                hint: "Each import must be a JavaScript identifier".into(),
            }
            .into());
        }

        Ok(())
    }
}

impl From<HeftConfig> for StatsOptions {
    fn from(config: HeftConfig) -> Self {
        StatsOptions {
            minifier: config.minifier,
            client: config.client,
            install_timeout: config.install_timeout,
            network_concurrency: config.network_concurrency,
            limit_concurrency: config.limit_concurrency,
            custom_imports: config.custom_imports,
            split_custom_imports: config.split_custom_imports,
            include_dependency_sizes: config.include_dependency_sizes,
            calc_parse: config.calc_parse,
            debug: config.debug,
            tmp_dir: config.tmp_dir,
        }
    }
}
