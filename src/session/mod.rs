// src/session/mod.rs

//! The sequential trigger path.
//!
//! A [`Session`] owns the [`Launcher`] and processes [`SessionEvent`]s one at
//! a time from a single channel. Events come from stdin ([`input`]), the file
//! watcher and Ctrl-C. Command edits happen here, between launches, and every
//! edit is followed by a launch so the buffer always shows the output of the
//! command as currently written.

pub mod input;

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::buffer::{CommandEditor, OutputBuffer};
use crate::errors::Result;
use crate::supervisor::Launcher;

/// Something that may cause a re-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Run the command again as it is.
    Get,
    /// Drop the last word of the command, then run.
    Back,
    /// Append words to the command, then run.
    Append(String),
    /// Flip auto mode, then run.
    ToggleAuto,
    /// Watched files changed; runs only in auto mode.
    FileChanged(Vec<PathBuf>),
    /// Stop the session.
    Quit,
}

/// Whether the loop should keep going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session<B: ?Sized> {
    launcher: Launcher<B>,
    events: mpsc::Receiver<SessionEvent>,
    auto: bool,
}

impl<B> Session<B>
where
    B: OutputBuffer + CommandEditor + ?Sized + 'static,
{
    pub fn new(launcher: Launcher<B>, events: mpsc::Receiver<SessionEvent>, auto: bool) -> Self {
        Self {
            launcher,
            events,
            auto,
        }
    }

    pub fn auto(&self) -> bool {
        self.auto
    }

    pub fn launcher(&self) -> &Launcher<B> {
        &self.launcher
    }

    /// Launch once, then react to events until `Quit` or the channel closes.
    ///
    /// A failed launch ends the loop with that error. Whatever is still
    /// running is killed on the way out.
    pub async fn run(mut self) -> Result<()> {
        info!(cmd = %self.launcher.buffer().command(), auto = self.auto, "session started");

        let result = self.event_loop().await;
        if let Err(err) = &result {
            error!(error = %err, "session halted");
        }

        if let Err(err) = self.launcher.retire().await {
            if result.is_err() {
                error!(error = %err, "failed to stop the running command");
            } else {
                return Err(err);
            }
        }
        info!("session finished");
        result
    }

    async fn event_loop(&mut self) -> Result<()> {
        self.launcher.launch().await?;

        while let Some(event) = self.events.recv().await {
            debug!(?event, "session received event");
            if self.handle(event).await? == Flow::Quit {
                return Ok(());
            }
        }

        debug!("session event channel closed");
        Ok(())
    }

    /// Apply one event. Exposed for tests that drive the session by hand.
    pub async fn handle(&mut self, event: SessionEvent) -> Result<Flow> {
        match event {
            SessionEvent::Get => {}
            SessionEvent::Back => self.launcher.buffer().drop_last_word()?,
            SessionEvent::Append(text) => self.launcher.buffer().append_words(&text)?,
            SessionEvent::ToggleAuto => {
                self.auto = !self.auto;
                info!(auto = self.auto, "auto mode toggled");
            }
            SessionEvent::FileChanged(paths) => {
                if !self.auto {
                    debug!(?paths, "file change ignored outside auto mode");
                    return Ok(Flow::Continue);
                }
                info!(?paths, "file change triggers re-run");
            }
            SessionEvent::Quit => return Ok(Flow::Quit),
        }

        let generation = self.launcher.launch().await?;
        debug!(generation = %generation, "launched");
        Ok(Flow::Continue)
    }
}
