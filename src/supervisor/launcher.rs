// src/supervisor/launcher.rs

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::buffer::OutputBuffer;
use crate::errors::{RelaunchError, Result};

use super::executor::{execute, RunContext};
use super::process::{KillOutcome, ProcessHandle};
use super::{Advance, Generation, Registry, RunOptions};

/// Entry point for "run the command again".
///
/// `launch` is called from the sequential trigger path. It returns as soon as
/// the new executor task is spawned; the run itself reports only through the
/// buffer.
pub struct Launcher<B: ?Sized> {
    ctx: RunContext<B>,
}

impl<B: ?Sized> std::fmt::Debug for Launcher<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launcher")
            .field("registry", &self.ctx.registry)
            .field("options", &self.ctx.options)
            .finish_non_exhaustive()
    }
}

impl<B> Launcher<B>
where
    B: OutputBuffer + ?Sized + 'static,
{
    pub fn new(registry: Arc<Registry>, buffer: Arc<B>, options: RunOptions) -> Self {
        Self {
            ctx: RunContext {
                registry,
                buffer,
                options: Arc::new(options),
            },
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.ctx.registry
    }

    pub fn buffer(&self) -> &Arc<B> {
        &self.ctx.buffer
    }

    /// Supersede whatever is running and start a new generation.
    ///
    /// Fails if the buffer cannot be read/cleared (nothing is advanced then)
    /// or if killing the previous process fails for any reason other than it
    /// having already exited.
    pub async fn launch(&self) -> Result<Generation> {
        let buffer = Arc::clone(&self.ctx.buffer);
        let (advance, command) = self
            .ctx
            .registry
            .try_advance_with(|| buffer.read_command_and_clear())?;
        let Advance {
            generation,
            previous,
        } = advance;

        if let Some(previous) = previous {
            kill_previous(generation, previous).await?;
        }

        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            let outcome = execute(ctx, generation, command).await;
            debug!(generation = %generation, ?outcome, "run finished");
        });

        Ok(generation)
    }

    /// Supersede the current run without starting a new one.
    ///
    /// Any later write from the old executor is suppressed and its process is
    /// killed. Used when the session shuts down.
    pub async fn retire(&self) -> Result<()> {
        let Advance {
            generation,
            previous,
        } = self.ctx.registry.advance();
        debug!(generation = %generation, "retiring current run");
        if let Some(previous) = previous {
            kill_previous(generation, previous).await?;
        }
        Ok(())
    }
}

/// Kill the process handed over by an advance to `generation`.
async fn kill_previous(generation: Generation, previous: ProcessHandle) -> Result<()> {
    let old = previous.generation();
    let pid = previous.pid();
    match previous.kill().await {
        Ok(KillOutcome::Killed) => {
            info!(generation = %generation, old_generation = %old, ?pid, "killed superseded process");
            Ok(())
        }
        Ok(KillOutcome::AlreadyExited) => {
            debug!(generation = %generation, old_generation = %old, ?pid, "superseded process already exited");
            Ok(())
        }
        Err(source) => {
            error!(old_generation = %old, ?pid, error = %source, "failed to kill superseded process");
            Err(RelaunchError::Kill {
                generation: old,
                source,
            })
        }
    }
}
