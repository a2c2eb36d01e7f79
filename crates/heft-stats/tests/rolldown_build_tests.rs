//! End-to-end builds through rolldown over a hand-populated sandbox.

mod helpers;

use heft_stats::{BuildOptions, Externals, RolldownCompiler, build_package_ignoring_missing_deps};
use helpers::project_with_package;

fn tiny_package() -> tempfile::TempDir {
    let body = (0..40)
        .map(|i| format!("exports.helper{i} = function helper{i}(value) {{ return value * {i} + 'suffix-{i}'; }};\n"))
        .collect::<String>();

    let project = project_with_package(
        "tiny-pkg",
        &[
            ("package.json", r#"{"name":"tiny-pkg","version":"1.0.0","main":"index.js"}"#),
            ("index.js", &body),
        ],
    );
    std::fs::write(project.path().join("package.json"), r#"{"dependencies":{}}"#).unwrap();
    project
}

#[tokio::test(flavor = "multi_thread")]
async fn measures_a_commonjs_package() {
    let project = tiny_package();
    let options = BuildOptions {
        include_dependency_sizes: true,
        ..Default::default()
    };

    let result = build_package_ignoring_missing_deps(
        &RolldownCompiler::new(),
        "tiny-pkg",
        project.path(),
        Externals::default(),
        &options,
    )
    .await
    .unwrap();

    assert_eq!(result.assets.len(), 1, "{:?}", result.assets);
    let main = &result.assets[0];
    assert_eq!(main.name, "main");
    assert_eq!(main.asset_type, "js");
    assert!(main.size > 0);
    assert!(main.gzip <= main.size);

    let sizes = result.dependency_sizes.unwrap();
    assert!(sizes.iter().any(|dep| dep.name == "tiny-pkg" && dep.approximate_size > 0));
    assert!(result.ignored_missing_dependencies.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn undeclared_dependency_is_ignored_on_retry() {
    let project = project_with_package(
        "needs-peer",
        &[
            ("package.json", r#"{"name":"needs-peer","main":"index.js"}"#),
            ("index.js", "module.exports = require('absent-peer')('padding');"),
        ],
    );

    let result = build_package_ignoring_missing_deps(
        &RolldownCompiler::new(),
        "needs-peer",
        project.path(),
        Externals::default(),
        &BuildOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.ignored_missing_dependencies, Some(vec!["absent-peer".to_string()]));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_package_is_an_entry_point_error() {
    let project = tempfile::TempDir::new().unwrap();

    let err = build_package_ignoring_missing_deps(
        &RolldownCompiler::new(),
        "not-installed",
        project.path(),
        Externals::default(),
        &BuildOptions::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.name(), "EntryPointError");
}
