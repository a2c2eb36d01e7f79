//! Turning compiler output into a typed failure.

use regex::Regex;
use std::sync::LazyLock;

use crate::bundler::{CompileCrash, CompileOutput, StatsError, StatsErrorKind};
use crate::{Error, Result};

static MISSING_MODULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Can't resolve '(.+?)' in").expect("missing-module pattern is valid")
});

static SCOPED_PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@[^/]+/[^/]+").expect("scoped package pattern is valid"));

static UNSCOPED_PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/]+").expect("package pattern is valid"));

/// Syntax errors that show up when CLI-style sources leak into a bundle.
const CLI_SIGNATURES: &[&str] = &["Unexpected character '#'", "Invalid Character `#`"];

/// Longest name npm accepts.
const MAX_PACKAGE_NAME_LENGTH: usize = 214;

/// Error for a compile that never produced stats.
pub(crate) fn crash_error(crash: &CompileCrash) -> Error {
    match crash {
        CompileCrash::RejectedOptions(message) => Error::wrong_bundler_version(message.as_str()),
        CompileCrash::Failed(message) => Error::build(message.as_str()),
    }
}

/// Classify a compile. `Ok(())` means the build produced usable stats.
///
/// The first matching rule wins: a crash, missing stats, unresolvable
/// imports (the package itself or its dependencies), a CLI syntax
/// signature, any other error, and finally empty stats.
pub(crate) fn classify(package_name: &str, output: &CompileOutput) -> Result<()> {
    let Some(stats) = &output.stats else {
        return Err(match &output.crash {
            Some(crash) => crash_error(crash),
            None => Error::unexpected_build("Expected bundler stats to be present, but they were not"),
        });
    };

    if stats.has_errors() {
        let messages: Vec<String> = stats.errors.iter().map(|e| e.message.clone()).collect();
        let missing = parse_missing_modules(&stats.errors)?;

        if !missing.is_empty() {
            if missing.len() == 1 && missing[0] == package_name {
                return Err(Error::entry_point(messages));
            }
            return Err(Error::missing_dependency(messages, missing));
        }

        if messages
            .iter()
            .any(|message| CLI_SIGNATURES.iter().any(|sig| message.contains(sig)))
        {
            return Err(Error::cli_build(messages));
        }

        tracing::error!(errors = ?messages, "Bundler reported errors");
        return Err(Error::build(messages));
    }

    if stats.is_empty() {
        return Err(Error::unexpected_build("The bundler stats were unexpectedly empty"));
    }

    Ok(())
}

/// Package names behind every module-not-found error, deduplicated, with
/// sub-paths of an already-listed package dropped.
pub(crate) fn parse_missing_modules(errors: &[StatsError]) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();

    for error in errors.iter().filter(|e| e.kind == StatsErrorKind::ModuleNotFound) {
        let path = MISSING_MODULE
            .captures(&error.message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| {
                Error::unexpected_build(
                    "Expected to find a file path in the module not found error, but found none",
                )
            })?;

        let pattern = if path.starts_with('@') {
            &SCOPED_PACKAGE
        } else {
            &UNSCOPED_PACKAGE
        };
        let name = pattern.find(path).map(|m| m.as_str()).ok_or_else(|| {
            Error::unexpected_build(format!("Failed to resolve the missing package name from '{path}'"))
        })?;

        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    let deduplicated = names
        .iter()
        .filter(|name| {
            !names
                .iter()
                .any(|other| other != *name && name.starts_with(&format!("{other}/")))
        })
        .cloned()
        .collect();
    Ok(deduplicated)
}

/// Whether `name` is a name npm would accept for a new package.
pub fn is_valid_package_name(name: &str) -> bool {
    if name.is_empty()
        || name.len() > MAX_PACKAGE_NAME_LENGTH
        || name.trim() != name
        || name.starts_with('.')
        || name.starts_with('_')
        || matches!(name, "node_modules" | "favicon.ico")
    {
        return false;
    }

    let url_safe =
        |part: &str| !part.is_empty() && part.bytes().all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_'));

    match name.strip_prefix('@') {
        Some(scoped) => match scoped.split_once('/') {
            Some((scope, package)) => {
                url_safe(scope)
                    && url_safe(package)
                    && !package.starts_with('.')
                    && !package.starts_with('_')
            }
            None => false,
        },
        None => url_safe(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::Stats;

    fn not_found(specifier: &str) -> StatsError {
        StatsError::module_not_found(specifier, "/sandbox")
    }

    fn with_errors(errors: Vec<StatsError>) -> CompileOutput {
        CompileOutput {
            stats: Some(Stats {
                errors,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_missing_modules_normalizes_names() {
        let errors = vec![
            not_found("@babel/runtime/helpers/extends"),
            not_found("babel-runtime/core-js/object"),
            not_found("@babel/runtime"),
            StatsError::other("unrelated"),
        ];
        assert_eq!(
            parse_missing_modules(&errors).unwrap(),
            vec!["@babel/runtime", "babel-runtime"]
        );
    }

    #[test]
    fn test_parse_missing_modules_rejects_unexpected_message() {
        let errors = vec![StatsError {
            kind: StatsErrorKind::ModuleNotFound,
            message: "something else".into(),
        }];
        assert_eq!(
            parse_missing_modules(&errors).unwrap_err().name(),
            "UnexpectedBuildError"
        );
    }

    #[test]
    fn test_classification_order() {
        let crash = CompileOutput::crashed(CompileCrash::RejectedOptions("bad".into()));
        assert_eq!(classify("p", &crash).unwrap_err().name(), "WrongBundlerVersionError");

        let crash = CompileOutput::crashed(CompileCrash::Failed("boom".into()));
        assert_eq!(classify("p", &crash).unwrap_err().name(), "BuildError");

        let no_stats = CompileOutput::default();
        assert_eq!(classify("p", &no_stats).unwrap_err().name(), "UnexpectedBuildError");

        let own = with_errors(vec![not_found("p")]);
        assert_eq!(classify("p", &own).unwrap_err().name(), "EntryPointError");

        let dep = classify("p", &with_errors(vec![not_found("left-pad")])).unwrap_err();
        assert_eq!(dep.missing_modules(), Some(&["left-pad".to_string()][..]));

        let own_and_dep = with_errors(vec![not_found("p"), not_found("q")]);
        assert_eq!(
            classify("p", &own_and_dep).unwrap_err().name(),
            "MissingDependencyError"
        );

        let cli = with_errors(vec![StatsError::other("x.js: Unexpected character '#' (1:0)")]);
        assert_eq!(classify("p", &cli).unwrap_err().name(), "CLIBuildError");

        let generic = with_errors(vec![StatsError::other("Unexpected token")]);
        assert_eq!(classify("p", &generic).unwrap_err().name(), "BuildError");

        let empty = with_errors(Vec::new());
        assert_eq!(classify("p", &empty).unwrap_err().name(), "UnexpectedBuildError");
    }

    #[test]
    fn test_is_valid_package_name() {
        for valid in ["left-pad", "@babel/core", "lodash.merge", "a_b", "react-dom", "fs"] {
            assert!(is_valid_package_name(valid), "{valid}");
        }
        for invalid in [
            "",
            ".bin",
            "_private",
            "Upper",
            " spaced",
            "a b",
            "@scope",
            "@scope/",
            "node_modules",
            "favicon.ico",
            "./relative",
            "a!b",
        ] {
            assert!(!is_valid_package_name(invalid), "{invalid:?}");
        }
        assert!(!is_valid_package_name(&"a".repeat(215)));
    }
}
