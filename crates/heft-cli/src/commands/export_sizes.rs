//! `heft export-sizes`: the cost of importing each export on its own.

use crate::cli::MeasureArgs;
use crate::commands::utils;
use crate::error::Result;
use crate::ui;

pub async fn execute(args: MeasureArgs) -> Result<()> {
    let options = utils::load_options(&args)?;
    let mut result = utils::with_spinner(
        &args,
        "Measured exports of",
        heft_stats::get_package_export_sizes(&args.package, &options),
    )
    .await?;

    if args.json {
        return utils::print_json(&result);
    }

    result.assets.sort_by(|a, b| b.gzip.cmp(&a.gzip).then_with(|| a.name.cmp(&b.name)));
    println!("\n{}: {} exports, largest first", args.package, result.assets.len());
    ui::print_size_table(&result.assets);

    if let Some(ignored) = &result.ignored_missing_dependencies {
        ui::warning(&format!(
            "Treated undeclared imports as external: {}",
            ignored.join(", ")
        ));
    }
    Ok(())
}
