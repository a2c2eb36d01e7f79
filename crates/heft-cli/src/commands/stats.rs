//! `heft stats`: size of the whole package and its dependencies.

use heft_stats::PackageStats;
use heft_stats::package::SideEffects;

use crate::cli::MeasureArgs;
use crate::commands::utils;
use crate::error::Result;
use crate::ui;

pub async fn execute(args: MeasureArgs) -> Result<()> {
    let options = utils::load_options(&args)?;
    let stats = utils::with_spinner(&args, "Measured", heft_stats::get_package_stats(
        &args.package,
        &options,
    ))
    .await?;

    if args.json {
        return utils::print_json(&stats);
    }
    render(&args.package, &stats);
    Ok(())
}

fn render(package: &str, stats: &PackageStats) {
    let title = match (&stats.details.name, &stats.details.version) {
        (Some(name), Some(version)) => format!("{name}@{version}"),
        (Some(name), None) => name.clone(),
        _ => package.to_string(),
    };

    println!();
    println!(
        "{title}  {} minified, {} gzipped",
        ui::format_size(stats.size as u64),
        ui::format_size(stats.gzip as u64)
    );
    if let Some(parse) = &stats.parse {
        println!(
            "  parse time {:.2}ms (reference script {:.2}ms)",
            parse.script_parse_time, parse.base_parse_time
        );
    }
    println!("  {}", summary(stats));

    if stats.build.assets.len() > 1 {
        println!("\nAssets");
        ui::print_size_table(&stats.build.assets);
    }

    if let Some(dependencies) = stats.build.dependency_sizes.as_deref().filter(|d| !d.is_empty()) {
        println!("\nDependencies");
        ui::print_dependency_breakdown(dependencies);
    }

    if let Some(ignored) = &stats.build.ignored_missing_dependencies {
        ui::warning(&format!(
            "Treated undeclared imports as external: {}",
            ignored.join(", ")
        ));
    }
}

fn summary(stats: &PackageStats) -> String {
    let details = &stats.details;
    let side_effects = match &details.has_side_effects {
        SideEffects::Flag(true) => "has side effects".to_string(),
        SideEffects::Flag(false) => "side-effect free".to_string(),
        SideEffects::Patterns(globs) => format!("side effects in {} pattern(s)", globs.len()),
    };
    let module = if details.has_js_module || details.has_js_next || details.is_module_type {
        "ships ESM"
    } else {
        "CommonJS only"
    };

    format!(
        "{} dependencies, {} peer, {module}, {side_effects}",
        details.dependency_count,
        details.peer_dependencies.len()
    )
}
