//! Logging setup for the heft binary.
//!
//! Diagnostics go to stderr so `--json` output on stdout stays parseable.
//! Level selection, strongest first:
//!
//! 1. `--verbose`: debug for heft crates, including phase telemetry
//! 2. `--quiet`: errors only
//! 3. `HEFT_LOG`: any `EnvFilter` directive string
//! 4. info for heft crates

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding a custom filter.
pub const LOG_ENV_VAR: &str = "HEFT_LOG";

const VERBOSE_FILTER: &str = "heft=debug,heft_stats=debug,heft_cli=debug";
const QUIET_FILTER: &str = "heft=error,heft_stats=error,heft_cli=error";
const DEFAULT_FILTER: &str = "heft_stats=info,heft_cli=info";

/// Install the global subscriber. Later calls are ignored.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

/// Install the global subscriber with an explicit filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}
