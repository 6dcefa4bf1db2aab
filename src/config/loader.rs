// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Default config location: `Relaunch.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Relaunch.toml")
}

/// Pick the raw configuration to start from.
///
/// - An explicit path must exist and parse.
/// - Otherwise `default_path` is used if it exists.
/// - Otherwise built-in defaults apply.
///
/// Validation is left to the caller so command-line overrides can be layered
/// on first.
pub fn resolve_config(explicit: Option<&Path>, default_path: &Path) -> Result<RawConfigFile> {
    match explicit {
        Some(path) => load_from_path(path),
        None if default_path.is_file() => {
            debug!(path = ?default_path, "using default config file");
            load_from_path(default_path)
        }
        None => Ok(RawConfigFile::default()),
    }
}
