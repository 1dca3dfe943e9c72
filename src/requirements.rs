//! Dependency list scanning.

use std::path::Path;

use anyhow::{Context, Result};

/// Read a plain-text requirements file and return its whitespace-separated
/// tokens in file order. Token syntax is not validated; a missing file is
/// an error for the caller to handle.
pub fn parse_requirements(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read requirements file: {}", path.display()))?;
    Ok(content.split_whitespace().map(str::to_string).collect())
}
