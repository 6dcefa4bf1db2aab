// src/buffer/mod.rs

//! The output surface the supervisor writes into.
//!
//! The supervisor only ever talks to an [`OutputBuffer`]; it does not know
//! whether the bytes end up in a terminal, an editor window or a test
//! recorder. Two implementations live here:
//!
//! - [`MemoryBuffer`] keeps everything in memory and records every call,
//!   which is what the tests assert against.
//! - [`TerminalBuffer`] writes through to a terminal (stdout in production).
//!
//! Both keep a [`Transcript`]: the command line followed by the output of the
//! most recent run.

pub mod memory;
pub mod terminal;
pub mod transcript;

use thiserror::Error;

pub use memory::MemoryBuffer;
pub use terminal::TerminalBuffer;
pub use transcript::{Transcript, PROMPT};

/// Failure reported by an output buffer.
#[derive(Error, Debug)]
pub enum BufferError {
    #[error("buffer I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("buffer unavailable: {0}")]
    Unavailable(String),
}

/// Boundary between the run supervisor and whatever displays its output.
///
/// All methods take `&self`: implementations are shared between the launch
/// path and the executor tasks and do their own interior locking. Every call
/// must be short and must not block on subprocess I/O, because executors
/// make them while holding the generation registry lock.
///
/// Known limitation: [`TerminalBuffer`] writes and flushes its writer inside
/// `append_text`. When stdout is a pipe nobody reads, that call blocks with
/// the registry lock held, and the next launch waits until the pipe drains.
pub trait OutputBuffer: Send + Sync {
    /// Read back the command recorded on the first line and erase all output
    /// below it, leaving the command line intact.
    fn read_command_and_clear(&self) -> Result<String, BufferError>;

    /// Append raw bytes to the end of the buffer.
    fn append_text(&self, bytes: &[u8]) -> Result<(), BufferError>;

    /// No run is in flight for the visible buffer state anymore.
    fn mark_settled(&self) -> Result<(), BufferError>;

    /// Ask the surface to expose the latest output. Purely cosmetic.
    fn signal_visible(&self) {}
}

/// Editing operations on the command line, used by the session layer
/// between launches.
pub trait CommandEditor: Send + Sync {
    /// Current command text (without the prompt marker).
    fn command(&self) -> String;

    /// Append whitespace-separated words to the command.
    fn append_words(&self, text: &str) -> Result<(), BufferError>;

    /// Drop the last word of the command, keeping at least one word.
    fn drop_last_word(&self) -> Result<(), BufferError>;
}
