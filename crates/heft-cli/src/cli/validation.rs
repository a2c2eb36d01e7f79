/// Parse an export name passed to `--import`.
///
/// The name ends up in `import { <name> } from '<package>'`, so it must be
/// a plain JavaScript identifier.
pub fn parse_import_name(s: &str) -> Result<String, String> {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return Err("Import name cannot be empty".to_string());
    };

    if !first.is_alphabetic() && first != '_' && first != '$' {
        return Err(format!(
            "Import name must start with a letter, underscore, or dollar sign: '{s}'"
        ));
    }

    if chars.any(|c| !c.is_alphanumeric() && c != '_' && c != '$') {
        return Err(format!(
            "Import name can only contain letters, numbers, underscores, or dollar signs: '{s}'"
        ));
    }

    Ok(s.to_string())
}

/// Parse `--network-concurrency`: a positive integer.
pub fn parse_concurrency(s: &str) -> Result<u32, String> {
    match s.parse::<u32>() {
        Ok(0) => Err("Network concurrency must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("Network concurrency must be a positive integer: '{s}'")),
    }
}
