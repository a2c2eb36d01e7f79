//! Command-line front end for the heft measurement engine.
//!
//! The binary is a thin layer over [`heft_stats`]:
//!
//! - [`cli`] parses arguments with clap
//! - [`config`] layers defaults, `heft.config.json`, `HEFT_*` variables and
//!   flags into a [`heft_stats::StatsOptions`]
//! - [`commands`] runs one measurement and renders it
//! - [`error`] and [`logger`] handle reporting
//!
//! ```rust,no_run
//! use heft_cli::logger;
//!
//! logger::init_logger(false, false, false);
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, ConfigError, Result};
