//! Error types for the heft binary.
//!
//! Measurement failures keep their engine category ([`heft_stats::Error`]);
//! everything the CLI adds on top (configuration, output) has its own
//! variants with a hint for the user.

use miette::Report;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A measurement failed; the engine error carries its own diagnostic.
    #[error(transparent)]
    Stats(#[from] heft_stats::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}\n\nHint: Create a heft.config.json file or fix the --config path", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid configuration: {message}\n\nHint: Check heft.config.json and HEFT_* variables for unknown keys or wrong types")]
    Invalid { message: String },

    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Turn a [`CliError`] into a report for `main`.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Stats(e) => Report::new(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        other => miette::miette!("{}", other),
    }
}
