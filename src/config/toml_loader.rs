//! TOML configuration file loading.
use anyhow::{Context, Result};
use std::path::Path;

use super::LoggerOptions;

/// Load [`LoggerOptions`] from a TOML file.
///
/// A missing file yields default (empty) options so that callers can point at
/// an optional config path unconditionally.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_options(path: &Path) -> Result<LoggerOptions> {
    if !path.exists() {
        return Ok(LoggerOptions::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
}
