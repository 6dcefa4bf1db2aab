use std::sync::atomic::{AtomicUsize, Ordering};

use relaunch::buffer::{BufferError, CommandEditor, OutputBuffer};

/// A buffer whose contents can never be read back, so every launch fails
/// before advancing. Counts writes so tests can assert none happened.
#[derive(Debug, Default)]
pub struct UnreadableBuffer {
    pub writes: AtomicUsize,
}

impl UnreadableBuffer {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl OutputBuffer for UnreadableBuffer {
    fn read_command_and_clear(&self) -> Result<String, BufferError> {
        Err(BufferError::Unavailable("window is gone".to_string()))
    }

    fn append_text(&self, _bytes: &[u8]) -> Result<(), BufferError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn mark_settled(&self) -> Result<(), BufferError> {
        Ok(())
    }
}

impl CommandEditor for UnreadableBuffer {
    fn command(&self) -> String {
        String::new()
    }

    fn append_words(&self, _text: &str) -> Result<(), BufferError> {
        Err(BufferError::Unavailable("window is gone".to_string()))
    }

    fn drop_last_word(&self) -> Result<(), BufferError> {
        Err(BufferError::Unavailable("window is gone".to_string()))
    }
}
