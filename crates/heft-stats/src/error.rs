//! Failure taxonomy for package measurement.
//!
//! Every public operation in this crate fails with exactly one [`Error`]
//! variant. Each variant wraps the original error text reported by the
//! collaborator that failed (package manager, bundler, minifier, resolver)
//! plus typed context, which [`Error::extra`] exposes as structured JSON.

use miette::Diagnostic;
use serde::{Serialize, Serializer, ser::SerializeStruct};
use serde_json::{Value, json};
use thiserror::Error;

/// Result type for measurement operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Original error text(s) reported by a failing collaborator.
///
/// Bundlers report batches of errors, package managers report a single
/// stderr blob; both are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalError(Vec<String>);

impl OriginalError {
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.iter().any(|message| message.contains(needle))
    }
}

impl std::fmt::Display for OriginalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("\n"))
    }
}

impl From<String> for OriginalError {
    fn from(message: String) -> Self {
        Self(vec![message])
    }
}

impl From<&str> for OriginalError {
    fn from(message: &str) -> Self {
        Self(vec![message.to_string()])
    }
}

impl From<Vec<String>> for OriginalError {
    fn from(messages: Vec<String>) -> Self {
        Self(messages)
    }
}

impl From<std::io::Error> for OriginalError {
    fn from(err: std::io::Error) -> Self {
        Self(vec![err.to_string()])
    }
}

impl Serialize for OriginalError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => serializer.serialize_str(single),
            many => many.serialize(serializer),
        }
    }
}

/// Closed set of measurement failures.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum Error {
    /// The package manager failed for a reason other than "not found".
    #[error("InstallError: {original}")]
    #[diagnostic(
        code(heft::install),
        help("Check that the package manager is on PATH and the registry is reachable")
    )]
    Install { original: OriginalError },

    /// The registry reported that the package (or version) does not exist.
    #[error("PackageNotFoundError: {original}")]
    #[diagnostic(
        code(heft::package_not_found),
        help("Check the package name and version for typos")
    )]
    PackageNotFound { original: OriginalError },

    /// The synthetic entry could not be written, or the package itself is
    /// the only import that failed to resolve.
    #[error("EntryPointError: {original}")]
    #[diagnostic(
        code(heft::entry_point),
        help("The package could not be imported; it may not ship a browser-resolvable entry")
    )]
    EntryPoint { original: OriginalError },

    /// Imports other than the package itself could not be resolved.
    #[error("MissingDependencyError: could not resolve {missing_modules:?}")]
    #[diagnostic(
        code(heft::missing_dependency),
        help("The package imports modules it does not declare as dependencies")
    )]
    MissingDependency {
        original: OriginalError,
        missing_modules: Vec<String>,
    },

    /// Shebang-style CLI source leaked into the bundle.
    #[error("CLIBuildError: {original}")]
    #[diagnostic(
        code(heft::cli_build),
        help("The entry looks like a command-line script rather than a library")
    )]
    CliBuild { original: OriginalError },

    /// Generic bundler compilation failure.
    #[error("BuildError: {original}")]
    #[diagnostic(code(heft::build))]
    Build { original: OriginalError },

    /// Minifying a dependency's source failed.
    #[error("MinifyError: {message}")]
    #[diagnostic(code(heft::minify))]
    Minify {
        original: OriginalError,
        message: String,
        file_path: Option<String>,
    },

    /// An internal invariant of the orchestration was violated.
    #[error("UnexpectedBuildError: {original}")]
    #[diagnostic(
        code(heft::unexpected_build),
        help("This is a bug in heft, not in the measured package")
    )]
    UnexpectedBuild { original: OriginalError },

    /// The bundler rejected a configuration it should have accepted.
    #[error("WrongBundlerVersionError: {original}")]
    #[diagnostic(
        code(heft::wrong_bundler_version),
        help("The linked rolldown version does not accept heft's bundler options")
    )]
    WrongBundlerVersion { original: OriginalError },
}

impl Error {
    pub fn install(original: impl Into<OriginalError>) -> Self {
        Error::Install {
            original: original.into(),
        }
    }

    pub fn package_not_found(original: impl Into<OriginalError>) -> Self {
        Error::PackageNotFound {
            original: original.into(),
        }
    }

    pub fn entry_point(original: impl Into<OriginalError>) -> Self {
        Error::EntryPoint {
            original: original.into(),
        }
    }

    pub fn missing_dependency(
        original: impl Into<OriginalError>,
        missing_modules: Vec<String>,
    ) -> Self {
        Error::MissingDependency {
            original: original.into(),
            missing_modules,
        }
    }

    pub fn cli_build(original: impl Into<OriginalError>) -> Self {
        Error::CliBuild {
            original: original.into(),
        }
    }

    pub fn build(original: impl Into<OriginalError>) -> Self {
        Error::Build {
            original: original.into(),
        }
    }

    pub fn minify(
        original: impl Into<OriginalError>,
        message: impl Into<String>,
        file_path: Option<String>,
    ) -> Self {
        Error::Minify {
            original: original.into(),
            message: message.into(),
            file_path,
        }
    }

    pub fn unexpected_build(original: impl Into<OriginalError>) -> Self {
        Error::UnexpectedBuild {
            original: original.into(),
        }
    }

    pub fn wrong_bundler_version(original: impl Into<OriginalError>) -> Self {
        Error::WrongBundlerVersion {
            original: original.into(),
        }
    }

    /// Stable category name, used in telemetry and serialized output.
    pub fn name(&self) -> &'static str {
        match self {
            Error::Install { .. } => "InstallError",
            Error::PackageNotFound { .. } => "PackageNotFoundError",
            Error::EntryPoint { .. } => "EntryPointError",
            Error::MissingDependency { .. } => "MissingDependencyError",
            Error::CliBuild { .. } => "CLIBuildError",
            Error::Build { .. } => "BuildError",
            Error::Minify { .. } => "MinifyError",
            Error::UnexpectedBuild { .. } => "UnexpectedBuildError",
            Error::WrongBundlerVersion { .. } => "WrongBundlerVersionError",
        }
    }

    pub fn original(&self) -> &OriginalError {
        match self {
            Error::Install { original }
            | Error::PackageNotFound { original }
            | Error::EntryPoint { original }
            | Error::MissingDependency { original, .. }
            | Error::CliBuild { original }
            | Error::Build { original }
            | Error::Minify { original, .. }
            | Error::UnexpectedBuild { original }
            | Error::WrongBundlerVersion { original } => original,
        }
    }

    /// Structured context attached to the failure, `null` when there is none.
    pub fn extra(&self) -> Value {
        match self {
            Error::MissingDependency {
                missing_modules, ..
            } => json!({ "missingModules": missing_modules }),
            Error::Minify {
                message, file_path, ..
            } => json!({ "message": message, "filePath": file_path }),
            _ => Value::Null,
        }
    }

    pub fn missing_modules(&self) -> Option<&[String]> {
        match self {
            Error::MissingDependency {
                missing_modules, ..
            } => Some(missing_modules),
            _ => None,
        }
    }

    /// `{ name, originalError, extra }`, the wire shape callers persist.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name(),
            "originalError": self.original(),
            "extra": self.extra(),
        })
    }
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Error", 3)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("originalError", self.original())?;
        state.serialize_field("extra", &self.extra())?;
        state.end()
    }
}
