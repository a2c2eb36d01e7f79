//! `heft exports`: every export of a package and where it is defined.

use crate::cli::MeasureArgs;
use crate::commands::utils;
use crate::error::Result;
use crate::ui;

pub async fn execute(args: MeasureArgs) -> Result<()> {
    let options = utils::load_options(&args)?;
    let exports = utils::with_spinner(
        &args,
        "Resolved exports of",
        heft_stats::get_all_package_exports(&args.package, &options),
    )
    .await?;

    if args.json {
        return utils::print_json(&exports);
    }

    println!("\n{} exports {}", args.package, exports.len());
    ui::print_export_map(&exports);
    Ok(())
}
