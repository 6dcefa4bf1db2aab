// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::RawConfigFile;
use crate::errors::{RelaunchError, Result};

/// Command-line arguments for `relaunch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "relaunch",
    version,
    about = "Re-run a shell command, killing the previous run on every trigger.",
    long_about = None
)]
pub struct CliArgs {
    /// Re-run automatically when watched files change.
    #[arg(short = 'a', long)]
    pub auto: bool,

    /// Path to the config file (TOML).
    ///
    /// Default: `Relaunch.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Glob of files to watch (repeatable). Adds to `[watch].paths`.
    #[arg(long = "watch", value_name = "GLOB")]
    pub watch: Vec<String>,

    /// Glob of files to ignore (repeatable). Adds to `[watch].exclude`.
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Shell program used to interpret the command (run as `<shell> -c <cmd>`
    /// unless `[run].shell_args` says otherwise).
    #[arg(long, value_name = "PROGRAM")]
    pub shell: Option<String>,

    /// Clear the terminal before each run.
    #[arg(long)]
    pub clear: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RELAUNCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the effective settings and exit without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// The command to run; words are joined with spaces.
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl CliArgs {
    /// The command text, or an error if none was given.
    pub fn command_line(&self) -> Result<String> {
        let cmd = self.command.join(" ");
        if cmd.trim().is_empty() {
            return Err(RelaunchError::NoCommand);
        }
        Ok(cmd)
    }

    /// Layer CLI flags on top of the loaded config.
    pub fn apply_to(&self, cfg: &mut RawConfigFile) {
        if self.auto {
            cfg.session.auto = true;
        }
        if self.clear {
            cfg.run.clear_screen = true;
        }
        if let Some(shell) = &self.shell {
            cfg.run.shell = shell.clone();
        }
        cfg.watch.paths.extend(self.watch.iter().cloned());
        cfg.watch.exclude.extend(self.exclude.iter().cloned());
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
