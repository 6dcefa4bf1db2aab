// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::supervisor::{RunOptions, ShellCommand, DEFAULT_CHUNK_SIZE};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [run]
/// shell = "bash"
/// shell_args = ["-c"]
/// chunk_size = 4096
/// clear_screen = false
///
/// [watch]
/// paths = ["src/**/*.rs"]
/// exclude = ["target/**"]
/// use_hash = true
/// debounce_ms = 100
///
/// [session]
/// auto = true
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub session: SessionSection,
}

/// Validated configuration. Build it through `ConfigFile::try_from`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub run: RunSection,
    pub watch: WatchSection,
    pub session: SessionSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(run: RunSection, watch: WatchSection, session: SessionSection) -> Self {
        Self { run, watch, session }
    }

    /// Options handed to the supervisor.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            shell: ShellCommand::new(self.run.shell.clone(), self.run.shell_args.clone()),
            chunk_size: self.run.chunk_size,
        }
    }

    /// Whether file watching is configured at all.
    pub fn watch_enabled(&self) -> bool {
        !self.watch.paths.is_empty()
    }
}

/// `[run]` section: how commands are executed and shown.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Program that interprets the command text.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Arguments placed between the shell and the command text.
    #[serde(default = "default_shell_args")]
    pub shell_args: Vec<String>,

    /// Maximum bytes read from the output pipe at a time.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Clear the terminal before each run.
    #[serde(default)]
    pub clear_screen: bool,
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_shell_args() -> Vec<String> {
    vec!["-c".to_string()]
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            shell_args: default_shell_args(),
            chunk_size: default_chunk_size(),
            clear_screen: false,
        }
    }
}

/// `[watch]` section: file changes that re-run the command in auto mode.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Glob patterns, relative to the working directory.
    #[serde(default)]
    pub paths: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Only trigger when file contents actually changed.
    #[serde(default)]
    pub use_hash: bool,

    /// Quiet period that groups a burst of file events into one trigger.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    100
}

impl WatchSection {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            exclude: Vec::new(),
            use_hash: false,
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[session]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionSection {
    /// Start in auto mode: file changes re-run the command.
    #[serde(default)]
    pub auto: bool,
}
