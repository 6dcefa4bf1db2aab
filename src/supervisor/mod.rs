// src/supervisor/mod.rs

//! Run supervisor.
//!
//! Every trigger becomes a new [`Generation`]. The [`Registry`] holds the
//! current generation and the handle of its process under one lock; the
//! [`Launcher`] advances it, kills whatever was running before and spawns a
//! fresh [`executor`] task. Executors only write to the output buffer while
//! their generation is still current, so output of a superseded run never
//! reaches the buffer once a newer run has been requested.
//!
//! - [`registry`] owns the generation counter and the current process.
//! - [`process`] spawns commands with stdout and stderr merged into one pipe
//!   and implements the kill handshake between launcher and executor.
//! - [`executor`] runs one generation from spawn to settle.
//! - [`launcher`] is the entry point used by the session loop.

pub mod executor;
pub mod launcher;
pub mod process;
pub mod registry;

use std::fmt;

pub use executor::{execute, RunContext, RunOutcome};
pub use launcher::Launcher;
pub use process::{KillOutcome, KillReply, KillRequests, ProcessHandle};
pub use registry::{Advance, Registry};

/// Read size for the merged output pipe.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// One numbered attempt to run the command.
///
/// Strictly increasing and never reused. `Generation::default()` is the
/// value before anything was launched and is never given to an executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shell used to interpret the command text: `<program> <args...> <command>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for ShellCommand {
    fn default() -> Self {
        Self::new("bash", ["-c"])
    }
}

/// Knobs for running a generation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub shell: ShellCommand,
    pub chunk_size: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            shell: ShellCommand::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
