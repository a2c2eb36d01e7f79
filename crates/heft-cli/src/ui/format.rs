//! Human-readable sizes and result tables.

use heft_stats::{AssetStat, DependencySize, ExportMap};
use owo_colors::Style;
use std::time::Duration;

use super::messages::paint;

/// Format a byte count with binary units.
///
/// ```
/// use heft_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1_048_576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{size:.2} {}", UNITS[unit_idx])
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    if total_ms < 1000 {
        format!("{total_ms}ms")
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// `part` as a percentage of `total`, one decimal.
pub fn format_percent(part: u64, total: u64) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part as f64 * 100.0 / total as f64)
}

/// Print one row per asset: name, minified size, gzip size, and parse time
/// or defining file when known.
pub fn print_size_table(assets: &[AssetStat]) {
    for line in size_table(assets) {
        println!("{line}");
    }
}

fn size_table(assets: &[AssetStat]) -> Vec<String> {
    let labels: Vec<String> = assets
        .iter()
        .map(|asset| format!("{}.{}", asset.name, asset.asset_type))
        .collect();
    let width = labels.iter().map(String::len).max().unwrap_or(0);

    assets
        .iter()
        .zip(&labels)
        .map(|(asset, label)| {
            let mut line = format!(
                "  {}  {:>10}  {:>10} gzip",
                paint(&format!("{label:<width$}"), Style::new().bold()),
                format_size(asset.size as u64),
                format_size(asset.gzip as u64),
            );
            if let Some(parse) = &asset.parse {
                line.push_str(&paint(
                    &format!("  parse {:.2}ms", parse.script_parse_time),
                    Style::new().dimmed(),
                ));
            }
            if let Some(path) = &asset.path {
                line.push_str(&paint(&format!("  {path}"), Style::new().dimmed()));
            }
            line
        })
        .collect()
}

/// Print dependencies largest first with their share of the total.
pub fn print_dependency_breakdown(dependencies: &[DependencySize]) {
    for line in dependency_breakdown(dependencies) {
        println!("{line}");
    }
}

fn dependency_breakdown(dependencies: &[DependencySize]) -> Vec<String> {
    let mut sorted: Vec<&DependencySize> = dependencies.iter().collect();
    sorted.sort_by(|a, b| {
        b.approximate_size
            .cmp(&a.approximate_size)
            .then_with(|| a.name.cmp(&b.name))
    });

    let total: u64 = sorted.iter().map(|d| d.approximate_size as u64).sum();
    let width = sorted.iter().map(|d| d.name.len()).max().unwrap_or(0);

    sorted
        .into_iter()
        .map(|dep| {
            format!(
                "  {}  {:>10}  {:>6}",
                format!("{:<width$}", dep.name),
                format_size(dep.approximate_size as u64),
                format_percent(dep.approximate_size as u64, total),
            )
        })
        .collect()
}

/// Print `name  file` for every export.
pub fn print_export_map(exports: &ExportMap) {
    let width = exports.keys().map(String::len).max().unwrap_or(0);
    for (name, path) in exports {
        println!(
            "  {}  {}",
            paint(&format!("{name:<width$}"), Style::new().bold()),
            paint(path, Style::new().dimmed())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, size: usize, gzip: usize) -> AssetStat {
        AssetStat {
            name: name.into(),
            asset_type: "js".into(),
            size,
            gzip,
            parse: None,
            path: None,
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(10_485_760), "10.00 MB");
        assert_eq!(format_size(2_147_483_648), "2.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(1, 4), "25.0%");
        assert_eq!(format_percent(0, 0), "0.0%");
        assert_eq!(format_percent(2, 3), "66.7%");
    }

    #[test]
    fn test_dependency_breakdown_sorted_by_size() {
        let deps = vec![
            DependencySize {
                name: "small".into(),
                approximate_size: 100,
            },
            DependencySize {
                name: "large".into(),
                approximate_size: 300,
            },
        ];
        let lines = dependency_breakdown(&deps);
        assert!(lines[0].contains("large") && lines[0].contains("75.0%"));
        assert!(lines[1].contains("small") && lines[1].contains("25.0%"));
    }

    #[test]
    fn test_size_table_aligns_labels() {
        super::super::init_colors(true);
        let mut annotated = asset("map", 2048, 900);
        annotated.path = Some("node_modules/lodash-es/map.js".into());
        let lines = size_table(&[asset("main", 10, 8), annotated]);
        assert!(lines[0].starts_with("  main.js  "));
        assert!(lines[1].starts_with("  map.js   "));
        assert!(lines[1].contains("2.00 KB"));
        assert!(lines[1].ends_with("node_modules/lodash-es/map.js"));
    }
}
