//! Synthetic entry modules.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Entry file written when no name is given.
pub const DEFAULT_ENTRY_FILENAME: &str = "index.js";

/// Name of the entry in non-split builds.
pub const MAIN_ENTRY: &str = "main";

#[derive(Debug, Clone, Default)]
pub struct EntryOptions<'a> {
    /// Emit `import` syntax instead of `require`.
    pub esm: bool,
    /// Named bindings to import instead of the whole module.
    pub custom_imports: Option<&'a [String]>,
    pub entry_filename: Option<&'a str>,
}

/// Source of an entry that imports `package_name` and logs what it imported,
/// so nothing can be tree-shaken away.
pub fn entry_source(package_name: &str, options: &EntryOptions<'_>) -> String {
    let specifier = serde_json::Value::from(package_name).to_string();
    let imports = options
        .custom_imports
        .filter(|imports| !imports.is_empty())
        .map(|imports| imports.join(", "));

    match (options.esm, imports) {
        (true, Some(names)) => {
            format!("import {{ {names} }} from {specifier};\nconsole.log({names});\n")
        }
        (true, None) => format!("import p from {specifier};\nconsole.log(p);\n"),
        (false, Some(names)) => {
            format!("const {{ {names} }} = require({specifier});\nconsole.log({names});\n")
        }
        (false, None) => format!("const p = require({specifier});\nconsole.log(p);\n"),
    }
}

/// Write the entry for `package_name` into `install_path`.
pub async fn create_entry_point(
    package_name: &str,
    install_path: &Path,
    options: &EntryOptions<'_>,
) -> Result<PathBuf> {
    let filename = options.entry_filename.unwrap_or(DEFAULT_ENTRY_FILENAME);
    let entry_path = install_path.join(filename);

    tokio::fs::write(&entry_path, entry_source(package_name, options))
        .await
        .map_err(|e| {
            Error::entry_point(format!(
                "Failed to write entry point {}: {e}",
                entry_path.display()
            ))
        })?;

    Ok(entry_path)
}

/// File name for the split entry of `export_name`.
pub fn split_entry_filename(export_name: &str) -> String {
    format!("{export_name}.js")
}
