// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::HarnessFile;
use crate::config::validate::validate_config;
use crate::errors::Result;

/// Load a harness file from a given path.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<HarnessFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: HarnessFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a harness file from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks launch targets, durations, `after` references and cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<HarnessFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

/// `Harness.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Harness.toml")
}

/// Directory relative paths in a harness file are resolved against.
///
/// - If the path has a non-empty parent (e.g. "demos/Harness.toml"), that
///   directory.
/// - For a bare filename, the current working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
