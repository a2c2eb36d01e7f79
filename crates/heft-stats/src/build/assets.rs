//! Size, gzip and parse-time figures for emitted assets.

use flate2::{Compression, write::GzEncoder};
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;
use serde::Serialize;
use std::io::Write;
use std::sync::LazyLock;
use std::time::Instant;

use crate::bundler::{OutputFiles, Stats, StatsAsset};
use crate::{Error, Result};

/// Parse-time trials per measurement; the median is reported.
const PARSE_TRIALS: usize = 5;

/// Baseline parsed before every asset so parse times are comparable across
/// machines.
const REFERENCE_SCRIPT: &str = r#"
var counter = 0;
function increment(step) { counter += step || 1; return counter; }
var handlers = { click: function (e) { return increment(e.detail); } };
for (var i = 0; i < 10; i++) { handlers.click({ detail: i }); }
module.exports = { increment: increment, handlers: handlers };
"#;

static ASSET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\.bundle\.(.+)$").expect("asset name pattern is valid"));

/// Cold parse timings in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseTime {
    pub base_parse_time: f64,
    pub script_parse_time: f64,
}

/// Figures for one emitted asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetStat {
    /// Entry the asset belongs to.
    pub name: String,
    /// Extension, e.g. `js` or `css`.
    #[serde(rename = "type")]
    pub asset_type: String,
    pub size: usize,
    pub gzip: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse: Option<ParseTime>,
    /// File defining the export, in export-size builds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Gzipped length of `bytes` at the default compression level.
pub fn gzip_size(bytes: &[u8]) -> Result<usize> {
    let gzip_error = |e: std::io::Error| Error::unexpected_build(format!("Failed to gzip asset: {e}"));
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(gzip_error)?;
    let compressed = encoder.finish().map_err(gzip_error)?;
    Ok(compressed.len())
}

fn time_parse(code: &str) -> f64 {
    let started = Instant::now();
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::cjs()).parse();
    std::hint::black_box(&ret.program);
    started.elapsed().as_secs_f64() * 1000.0
}

fn median(mut samples: Vec<f64>) -> f64 {
    samples.sort_by(f64::total_cmp);
    let mid = samples.len() / 2;
    if samples.len() % 2 == 0 {
        (samples[mid - 1] + samples[mid]) / 2.0
    } else {
        samples[mid]
    }
}

/// Median parse time of the reference script and of `code`.
pub fn parse_time(code: &str) -> ParseTime {
    let mut base = Vec::with_capacity(PARSE_TRIALS);
    let mut script = Vec::with_capacity(PARSE_TRIALS);
    for _ in 0..PARSE_TRIALS {
        base.push(time_parse(REFERENCE_SCRIPT));
        script.push(time_parse(code));
    }
    ParseTime {
        base_parse_time: median(base),
        script_parse_time: median(script),
    }
}

/// Split `<entry>.bundle.<ext>` into entry and extension.
pub(crate) fn split_asset_name(name: &str) -> Result<(String, String)> {
    let caps = ASSET_NAME.captures(name).ok_or_else(|| {
        Error::unexpected_build(format!(
            "Found an asset without the `.bundle` suffix. A loader customization might be needed to recognize this asset type: {name}"
        ))
    })?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}

fn is_measured(asset: &StatsAsset) -> bool {
    !asset.chunk_names.iter().any(|chunk| chunk == "runtime") && !asset.name.ends_with("LICENSE.txt")
}

fn asset_stat(asset: &StatsAsset, contents: Vec<u8>, calc_parse: bool) -> Result<AssetStat> {
    let (name, asset_type) = split_asset_name(&asset.name)?;
    let gzip = gzip_size(&contents)?;
    let parse = (calc_parse && asset_type == "js")
        .then(|| parse_time(&String::from_utf8_lossy(&contents)));

    Ok(AssetStat {
        name,
        asset_type,
        size: asset.size,
        gzip,
        parse,
        path: None,
    })
}

/// Figures for every measurable asset in `stats`, in stats order.
pub(crate) async fn asset_stats(
    stats: &Stats,
    files: &OutputFiles,
    calc_parse: bool,
) -> Result<Vec<AssetStat>> {
    let mut tasks = Vec::new();
    for asset in stats.assets.iter().filter(|asset| is_measured(asset)) {
        let contents = files
            .get(&asset.name)
            .ok_or_else(|| {
                Error::unexpected_build(format!("Asset {} was not emitted", asset.name))
            })?
            .to_vec();
        let asset = asset.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            asset_stat(&asset, contents, calc_parse)
        }));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for joined in futures::future::join_all(tasks).await {
        results.push(
            joined.map_err(|e| Error::unexpected_build(format!("Asset task failed: {e}")))??,
        );
    }
    Ok(results)
}
