//! Grouping of bundler modules into first-level dependencies.

use heft_stats::{Minifier, Stats, StatsModule, bundle_size_tree, utf8_byte_len};

fn module(path: &str, source: &str) -> StatsModule {
    StatsModule::new(path, source)
}

#[tokio::test]
async fn groups_plain_scoped_and_pnpm_packages() {
    let stats = Stats {
        modules: vec![
            module("/sb/index.js", "require('pkg-a');"),
            module("/sb/node_modules/pkg-a/index.js", "module.exports = 'a';"),
            module("/sb/node_modules/pkg-a/lib/util.js", "exports.util = 1;"),
            module("/sb/node_modules/@scope/pkg-b/dist/b.js", "module.exports = 'b';"),
            module(
                "/sb/node_modules/.pnpm/pkg-c@1.0.0/node_modules/pkg-c/index.js",
                "module.exports = 'c';",
            ),
        ],
        ..Default::default()
    };

    let sizes = bundle_size_tree("pkg-a", &stats, Minifier::Compress).await.unwrap();
    let mut names: Vec<&str> = sizes.iter().map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["@scope/pkg-b", "pkg-a", "pkg-c"]);
    assert!(sizes.iter().all(|s| s.approximate_size > 0));
}

#[tokio::test]
async fn nested_packages_count_towards_their_parent() {
    let stats = Stats {
        modules: vec![
            module("/sb/node_modules/outer/index.js", "module.exports = require('inner');"),
            module(
                "/sb/node_modules/outer/node_modules/inner/index.js",
                "module.exports = function inner() { return 'a fairly long string literal'; };",
            ),
        ],
        ..Default::default()
    };

    let sizes = bundle_size_tree("outer", &stats, Minifier::Fast).await.unwrap();
    assert_eq!(sizes.len(), 1);
    assert_eq!(sizes[0].name, "outer");
    assert!(sizes[0].approximate_size > "module.exports=require(\"inner\");".len());
}

#[tokio::test]
async fn concatenated_modules_are_flattened_and_externals_skipped() {
    let mut concatenated = module("/sb/node_modules/esm-pkg/index.js + 2 modules", "");
    concatenated.source = None;
    concatenated.modules = vec![
        module("/sb/node_modules/esm-pkg/index.js", "export const a = 1;"),
        module("/sb/node_modules/esm-pkg/data.json", "{\"key\": \"value\"}"),
    ];

    let stats = Stats {
        modules: vec![
            concatenated,
            module("external \"react\"", "module.exports = React;"),
        ],
        ..Default::default()
    };

    let sizes = bundle_size_tree("esm-pkg", &stats, Minifier::Compress).await.unwrap();
    assert_eq!(sizes.len(), 1);
    assert_eq!(sizes[0].name, "esm-pkg");
}

#[tokio::test]
async fn modules_without_source_are_ignored() {
    let mut empty = module("/sb/node_modules/empty/index.js", "");
    empty.source = None;
    let stats = Stats {
        modules: vec![empty],
        ..Default::default()
    };

    assert!(bundle_size_tree("empty", &stats, Minifier::Compress).await.unwrap().is_empty());
}

#[test]
fn byte_length_matches_utf8_encoding() {
    assert_eq!(utf8_byte_len("a"), 1);
    assert_eq!(utf8_byte_len("中"), 3);
    assert_eq!(utf8_byte_len("🎉"), 4);
    let mixed = "héllo 世界 🎉!";
    assert_eq!(utf8_byte_len(mixed), mixed.len());
}
