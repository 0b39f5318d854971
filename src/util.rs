#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// A glob utility function to find transcript files matching `pattern`
/// directly under `dir`, sorted for stable processing order.
pub fn find_transcripts(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let mut full_pattern = dir.to_path_buf();
    full_pattern.push(pattern);
    let full_pattern = full_pattern
        .to_str()
        .context("Could not convert transcript directory to string")?
        .to_string();

    let mut paths: Vec<PathBuf> = glob(&full_pattern)
        .context("Could not create glob")?
        .filter_map(Result::ok)
        .collect();
    paths.sort();
    Ok(paths)
}

/// Writes `bytes` to `path` atomically: the content lands in a sibling
/// temporary file first and is renamed into place, so readers never observe
/// a partially written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, bytes)
        .with_context(|| format!("Could not write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Could not publish {}", path.display()))?;
    Ok(())
}

/// Escapes one CSV field: fields containing a comma, quote, or newline are
/// quoted with internal quotes doubled.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
