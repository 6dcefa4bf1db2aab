// src/buffer/transcript.rs

use std::fmt;

/// Marker printed in front of the command line.
pub const PROMPT: &str = "% ";

/// Text model behind every buffer: one command line, then the output of the
/// current run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    command: String,
    output: String,
}

impl Transcript {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: normalize(&command.into()),
            output: String::new(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn set_command(&mut self, command: &str) {
        self.command = normalize(command);
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    /// Append output bytes. Invalid UTF-8 is replaced, never rejected.
    pub fn push_output(&mut self, bytes: &[u8]) {
        self.output.push_str(&String::from_utf8_lossy(bytes));
    }

    pub fn append_words(&mut self, text: &str) {
        let extra = normalize(text);
        if extra.is_empty() {
            return;
        }
        if self.command.is_empty() {
            self.command = extra;
        } else {
            self.command.push(' ');
            self.command.push_str(&extra);
        }
    }

    /// Remove the last word. A single-word command is left alone so there is
    /// always something to run.
    pub fn drop_last_word(&mut self) -> bool {
        match self.command.rfind(' ') {
            Some(idx) => {
                self.command.truncate(idx);
                true
            }
            None => false,
        }
    }

    /// Header line as shown above the output, without the trailing newline.
    pub fn header(&self) -> String {
        format!("{PROMPT}{}", self.command)
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        f.write_str(&self.output)
    }
}

/// Collapse runs of whitespace and trim, so word editing stays predictable.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_renders_prompt_then_output() {
        let mut t = Transcript::new("echo  hi ");
        t.push_output(b"hi\n");
        assert_eq!(t.command(), "echo hi");
        assert_eq!(t.to_string(), "% echo hi\nhi\n");
    }

    #[test]
    fn back_keeps_the_last_remaining_word() {
        let mut t = Transcript::new("grep -n foo");
        assert!(t.drop_last_word());
        assert_eq!(t.command(), "grep -n");
        assert!(t.drop_last_word());
        assert!(!t.drop_last_word());
        assert_eq!(t.command(), "grep");
    }

    #[test]
    fn lossy_output_does_not_fail() {
        let mut t = Transcript::new("cat");
        t.push_output(&[b'a', 0xff, b'b']);
        assert_eq!(t.output(), "a\u{fffd}b");
    }

    proptest! {
        #[test]
        fn append_then_back_restores_command(
            base in "[a-z]{1,8}( [a-z]{1,8}){0,3}",
            word in "[a-z]{1,8}",
        ) {
            let mut t = Transcript::new(base.clone());
            t.append_words(&word);
            prop_assert!(t.drop_last_word());
            prop_assert_eq!(t.command(), base.as_str());
        }
    }
}
