use heft_stats::StatsOptions;
use serde::Serialize;
use std::future::Future;
use std::time::Instant;

use crate::cli::MeasureArgs;
use crate::config::HeftConfig;
use crate::error::Result;
use crate::ui::{self, Spinner};

/// Resolve the engine options for one command invocation.
pub(crate) fn load_options(args: &MeasureArgs) -> Result<StatsOptions> {
    let config = HeftConfig::for_args(args)?;
    tracing::debug!(?config, "Resolved configuration");
    Ok(config.into())
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run `operation` behind a spinner, reporting how it ended.
pub(crate) async fn with_spinner<T, F>(args: &MeasureArgs, verb: &str, operation: F) -> Result<T>
where
    F: Future<Output = heft_stats::Result<T>>,
{
    let spinner = Spinner::new(&format!("{verb} {}", args.package), args.json);
    let started = Instant::now();

    match operation.await {
        Ok(value) => {
            spinner.finish(&format!(
                "{verb} {} in {}",
                args.package,
                ui::format_duration(started.elapsed())
            ));
            Ok(value)
        }
        Err(err) => {
            spinner.fail(&format!("{} failed with {}", args.package, err.name()));
            Err(err.into())
        }
    }
}
