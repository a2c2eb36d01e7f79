//! Imports excluded from the measured bundle.

use serde::Serialize;
use std::path::Path;

use crate::Result;
use crate::package::PackageManifest;

/// Module names Node ships with.
pub const NODE_BUILTINS: &[&str] = &[
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Packages and built-ins the bundler must not pull into the bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Externals {
    pub external_packages: Vec<String>,
    pub external_built_ins: Vec<String>,
}

impl Externals {
    /// Append packages discovered during a build. Existing entries are kept.
    pub fn extend_packages<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.external_packages.contains(&name) {
                self.external_packages.push(name);
            }
        }
    }

    pub fn is_builtin(&self, specifier: &str) -> bool {
        self.external_built_ins.iter().any(|b| b == specifier)
    }
}

/// Derive externals from an already-parsed manifest.
///
/// Peer dependencies are always external. Built-ins are external unless the
/// package depends on a same-named shim or the built-in is the package itself.
pub fn externals_from_manifest(package_name: &str, manifest: &PackageManifest) -> Externals {
    let external_packages = manifest
        .peer_dependency_names()
        .map(str::to_string)
        .collect();

    let external_built_ins = NODE_BUILTINS
        .iter()
        .copied()
        .filter(|builtin| *builtin != package_name)
        .filter(|builtin| !manifest.dependencies.contains_key(*builtin))
        .map(str::to_string)
        .collect();

    Externals {
        external_packages,
        external_built_ins,
    }
}

/// Read the installed package's manifest and derive its externals.
pub async fn compute_externals(package_name: &str, manifest_path: &Path) -> Result<Externals> {
    let manifest = PackageManifest::read(manifest_path).await?;
    let externals = externals_from_manifest(package_name, &manifest);

    tracing::debug!(
        package = package_name,
        peers = externals.external_packages.len(),
        builtins = externals.external_built_ins.len(),
        "Computed externals"
    );

    Ok(externals)
}
