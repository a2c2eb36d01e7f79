use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use heft_stats::{InstallClient, Minifier};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::MeasureArgs;
use crate::config::HeftConfig;
use crate::error::{ConfigError, Result};

pub const CONFIG_FILE_NAME: &str = "heft.config.json";

/// Prefix of configuration environment variables, e.g. `HEFT_CLIENT`.
pub const ENV_PREFIX: &str = "HEFT_";

/// Variables under [`ENV_PREFIX`] that are not configuration keys.
const RESERVED_ENV_KEYS: &[&str] = &["LOG"];

/// Settings given on the command line. Unset fields leave lower layers
/// alone, so a boolean flag can switch a setting on but never off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<InstallClient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minifier: Option<Minifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_concurrency: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_concurrency: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_imports: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_custom_imports: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_dependency_sizes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calc_parse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmp_dir: Option<PathBuf>,
}

impl From<&MeasureArgs> for CliOverrides {
    fn from(args: &MeasureArgs) -> Self {
        Self {
            client: args.client.map(Into::into),
            minifier: args.minifier.map(Into::into),
            install_timeout: args.install_timeout,
            network_concurrency: args.network_concurrency,
            limit_concurrency: args.limit_concurrency.then_some(true),
            custom_imports: (!args.imports.is_empty()).then(|| args.imports.clone()),
            split_custom_imports: args.split.then_some(true),
            include_dependency_sizes: args.no_dependency_sizes.then_some(false),
            calc_parse: args.parse.then_some(true),
            debug: args.debug.then_some(true),
            tmp_dir: args.tmp_dir.clone(),
        }
    }
}

impl HeftConfig {
    /// Load configuration from every layer.
    ///
    /// `config_path` must exist when given; otherwise `heft.config.json` in
    /// `cwd` is used when present.
    pub fn load(overrides: &CliOverrides, config_path: Option<&Path>, cwd: &Path) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(HeftConfig::default()));

        if let Some(path) = config_file(config_path, cwd)? {
            tracing::debug!(path = %path.display(), "Loading config file");
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(RESERVED_ENV_KEYS)
                .map(|key| env_key_to_field(key.as_str()).into())
                .lowercase(false),
        );
        figment = figment.merge(Serialized::defaults(overrides));

        let config: HeftConfig = figment.extract().map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration for one measurement command.
    pub fn for_args(args: &MeasureArgs) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load(&CliOverrides::from(args), args.config.as_deref(), &cwd)
    }
}

fn config_file(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) => {
            let path = if path.is_absolute() { path.to_path_buf() } else { cwd.join(path) };
            if path.is_file() {
                Ok(Some(path))
            } else {
                Err(ConfigError::NotFound(path).into())
            }
        }
        None => {
            let default_path = cwd.join(CONFIG_FILE_NAME);
            Ok(default_path.is_file().then_some(default_path))
        }
    }
}

/// `install_timeout` (the lowercased variable suffix) -> `installTimeout`.
pub(crate) fn env_key_to_field(key: &str) -> String {
    let mut field = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            field.extend(c.to_uppercase());
            upper = false;
        } else {
            field.extend(c.to_lowercase());
        }
    }
    field
}
