// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{RelaunchError, Result};

/// Upper bound for `[watch].debounce_ms`.
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RelaunchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.run, raw.watch, raw.session))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_run_section(cfg)?;
    validate_watch_section(cfg)?;
    Ok(())
}

fn validate_run_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.run.shell.trim().is_empty() {
        return Err(RelaunchError::ConfigError(
            "[run].shell must not be empty".to_string(),
        ));
    }

    if cfg.run.chunk_size == 0 {
        return Err(RelaunchError::ConfigError(
            "[run].chunk_size must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_watch_section(cfg: &RawConfigFile) -> Result<()> {
    for pat in cfg.watch.paths.iter().chain(cfg.watch.exclude.iter()) {
        if let Err(err) = Glob::new(pat) {
            return Err(RelaunchError::ConfigError(format!(
                "invalid glob pattern '{pat}' in [watch]: {err}"
            )));
        }
    }

    if cfg.watch.debounce_ms > MAX_DEBOUNCE_MS {
        return Err(RelaunchError::ConfigError(format!(
            "[watch].debounce_ms must be <= {MAX_DEBOUNCE_MS} (got {})",
            cfg.watch.debounce_ms
        )));
    }

    Ok(())
}
