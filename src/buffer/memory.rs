// src/buffer/memory.rs

use std::sync::{Arc, Mutex, MutexGuard};

use super::{BufferError, CommandEditor, OutputBuffer, Transcript};

#[derive(Debug, Default)]
struct MemoryState {
    transcript: Transcript,
    appends: Vec<Vec<u8>>,
    clears: usize,
    settles: usize,
    visible: usize,
}

/// In-memory buffer that records every call made against it.
///
/// Clones share the same state, so a test can hand one clone to the
/// supervisor and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBuffer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                transcript: Transcript::new(command),
                ..MemoryState::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn transcript(&self) -> Transcript {
        self.lock().transcript.clone()
    }

    /// Output of the current run, i.e. everything below the command line.
    pub fn output(&self) -> String {
        self.lock().transcript.output().to_string()
    }

    /// Every chunk appended since creation, including ones later cleared.
    pub fn appends(&self) -> Vec<Vec<u8>> {
        self.lock().appends.clone()
    }

    pub fn clear_count(&self) -> usize {
        self.lock().clears
    }

    pub fn settle_count(&self) -> usize {
        self.lock().settles
    }

    pub fn visible_count(&self) -> usize {
        self.lock().visible
    }

    pub fn set_command(&self, command: &str) {
        self.lock().transcript.set_command(command);
    }
}

impl OutputBuffer for MemoryBuffer {
    fn read_command_and_clear(&self) -> Result<String, BufferError> {
        let mut state = self.lock();
        state.transcript.clear_output();
        state.clears += 1;
        Ok(state.transcript.command().to_string())
    }

    fn append_text(&self, bytes: &[u8]) -> Result<(), BufferError> {
        let mut state = self.lock();
        state.transcript.push_output(bytes);
        state.appends.push(bytes.to_vec());
        Ok(())
    }

    fn mark_settled(&self) -> Result<(), BufferError> {
        self.lock().settles += 1;
        Ok(())
    }

    fn signal_visible(&self) {
        self.lock().visible += 1;
    }
}

impl CommandEditor for MemoryBuffer {
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
