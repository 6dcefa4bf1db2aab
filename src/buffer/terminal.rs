// src/buffer/terminal.rs

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::{BufferError, CommandEditor, OutputBuffer, Transcript};

const CLEAR_SCREEN: &[u8] = b"\x1b[2J\x1b[H";

struct TerminalState<W> {
    transcript: Transcript,
    writer: W,
}

/// Buffer that mirrors the transcript onto a terminal.
///
/// A terminal cannot erase what it already printed, so clearing prints a
/// fresh `% <command>` header (after an optional clear-screen sequence) and
/// output of the new run follows it.
pub struct TerminalBuffer<W: Write + Send> {
    state: Mutex<TerminalState<W>>,
    clear_screen: bool,
}

impl<W: Write + Send> std::fmt::Debug for TerminalBuffer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalBuffer")
            .field("clear_screen", &self.clear_screen)
            .finish_non_exhaustive()
    }
}

impl TerminalBuffer<io::Stdout> {
    pub fn stdout(command: impl Into<String>, clear_screen: bool) -> Self {
        Self::new(command, io::stdout(), clear_screen)
    }
}

impl<W: Write + Send> TerminalBuffer<W> {
    pub fn new(command: impl Into<String>, writer: W, clear_screen: bool) -> Self {
        Self {
            state: Mutex::new(TerminalState {
                transcript: Transcript::new(command),
                writer,
            }),
            clear_screen,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TerminalState<W>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn transcript(&self) -> Transcript {
        self.lock().transcript.clone()
    }

    /// Consume the buffer and hand back the writer (used by tests).
    pub fn into_writer(self) -> W {
        self.state
            .into_inner()
            .unwrap_or_else(|e| e.into_inner())
            .writer
    }
}

impl<W: Write + Send> OutputBuffer for TerminalBuffer<W> {
    fn read_command_and_clear(&self) -> Result<String, BufferError> {
        let mut state = self.lock();
        state.transcript.clear_output();
        let header = state.transcript.header();
        if self.clear_screen {
            state.writer.write_all(CLEAR_SCREEN)?;
        }
        writeln!(state.writer, "{header}")?;
        state.writer.flush()?;
        Ok(state.transcript.command().to_string())
    }

    fn append_text(&self, bytes: &[u8]) -> Result<(), BufferError> {
        let mut state = self.lock();
        state.transcript.push_output(bytes);
        state.writer.write_all(bytes)?;
        state.writer.flush()?;
        Ok(())
    }

    fn mark_settled(&self) -> Result<(), BufferError> {
        let state = self.lock();
        debug!(cmd = %state.transcript.command(), "terminal buffer settled");
        Ok(())
    }
}

impl<W: Write + Send> CommandEditor for TerminalBuffer<W> {
    fn command(&self) -> String {
        self.lock().transcript.command().to_string()
    }

    fn append_words(&self, text: &str) -> Result<(), BufferError> {
        self.lock().transcript.append_words(text);
        Ok(())
    }

    fn drop_last_word(&self) -> Result<(), BufferError> {
        self.lock().transcript.drop_last_word();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_prints_header_then_output_follows() {
        let buf = TerminalBuffer::new("echo hi", Vec::new(), false);
        let cmd = buf.read_command_and_clear().unwrap();
        buf.append_text(b"hi\n").unwrap();
        buf.mark_settled().unwrap();

        assert_eq!(cmd, "echo hi");
        assert_eq!(buf.transcript().output(), "hi\n");
        assert_eq!(buf.into_writer(), b"% echo hi\nhi\n".to_vec());
    }

    #[test]
    fn clear_screen_is_emitted_when_enabled() {
        let buf = TerminalBuffer::new("ls", Vec::new(), true);
        buf.read_command_and_clear().unwrap();
        let out = buf.into_writer();
        assert!(out.starts_with(CLEAR_SCREEN));
        assert!(out.ends_with(b"% ls\n"));
    }
}
