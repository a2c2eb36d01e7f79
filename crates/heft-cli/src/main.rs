//! heft - measure what an npm package costs a browser bundle.

use clap::Parser;
use heft_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Stats(measure) => commands::stats_execute(measure).await,
        cli::Command::Exports(measure) => commands::exports_execute(measure).await,
        cli::Command::ExportSizes(measure) => commands::export_sizes_execute(measure).await,
    };

    result.map_err(error::cli_error_to_miette)
}
