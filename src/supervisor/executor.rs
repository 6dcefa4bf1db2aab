// src/supervisor/executor.rs

//! Lifecycle of a single generation.

use std::process::ExitStatus;
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tracing::{debug, error, info, warn};

use crate::buffer::{BufferError, OutputBuffer};

use super::process::{kill_child, spawn_merged, KillReply, KillRequests, ProcessHandle, SpawnedProcess};
use super::{Generation, Registry, RunOptions};

/// How a generation ended, as seen by its executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A newer generation existed before the process could be registered.
    LostRace,
    /// A newer generation took over while the process was running.
    Superseded,
    /// The command could not be started.
    SpawnFailed,
    /// The process exited; `success` is false for non-zero or signalled exits.
    Exited { success: bool },
    /// The process could not be waited on.
    WaitFailed,
    /// The output buffer rejected a write.
    BufferFailed,
}

/// Everything an executor needs, shared between the launcher and all
/// executor tasks.
pub struct RunContext<B: ?Sized> {
    pub registry: Arc<Registry>,
    pub buffer: Arc<B>,
    pub options: Arc<RunOptions>,
}

impl<B: ?Sized> Clone for RunContext<B> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            buffer: Arc::clone(&self.buffer),
            options: Arc::clone(&self.options),
        }
    }
}

impl<B: OutputBuffer + ?Sized> RunContext<B> {
    /// Append `bytes` if `id` is still current. `None` means stale.
    fn write(&self, id: Generation, bytes: &[u8]) -> Option<Result<(), BufferError>> {
        self.registry.gate(id, || {
            self.buffer.signal_visible();
            self.buffer.append_text(bytes)
        })
    }

    /// Append a diagnostic line if `id` is still current.
    fn report(&self, id: Generation, line: &str) {
        let text = format!("{line}\n");
        if let Some(Err(err)) = self.write(id, text.as_bytes()) {
            error!(generation = %id, error = %err, "failed to write diagnostic to buffer");
        }
    }

    /// Forget the process of `id` and tell the buffer it is settled, both
    /// only if `id` is still current.
    fn settle(&self, id: Generation) {
        if !self.registry.mark_done(id) {
            return;
        }
        if let Some(Err(err)) = self.registry.gate(id, || self.buffer.mark_settled()) {
            error!(generation = %id, error = %err, "failed to mark buffer settled");
        }
    }
}

/// Run `command` as generation `id`: spawn, stream gated output, report the
/// exit and settle.
///
/// Meant to be spawned as an independent task. The return value is only
/// informational; all effects go through the registry and the buffer.
pub async fn execute<B>(ctx: RunContext<B>, id: Generation, command: String) -> RunOutcome
where
    B: OutputBuffer + ?Sized,
{
    info!(generation = %id, cmd = %command, "starting run");

    let SpawnedProcess { mut child, mut output } = match spawn_merged(&ctx.options.shell, &command) {
        Ok(spawned) => spawned,
        Err(err) => {
            warn!(generation = %id, error = %err, "failed to start command");
            ctx.report(id, &err.to_string());
            ctx.settle(id);
            return RunOutcome::SpawnFailed;
        }
    };

    let pid = child.id();
    let (handle, mut kills) = ProcessHandle::new(id, pid);
    if ctx.registry.set_process(id, handle).is_err() {
        debug!(generation = %id, ?pid, "superseded before registration; killing own process");
        if let Err(err) = kill_child(&mut child) {
            warn!(generation = %id, ?pid, error = %err, "failed to kill superseded process");
        }
        let _ = child.wait().await;
        return RunOutcome::LostRace;
    }

    let mut buf = vec![0u8; ctx.options.chunk_size.max(1)];
    loop {
        tokio::select! {
            biased;

            Some(reply) = kills.recv() => {
                serve_kill(id, &mut child, reply).await;
                return RunOutcome::Superseded;
            }

            read = output.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => match ctx.write(id, &buf[..n]) {
                    Some(Ok(())) => {}
                    Some(Err(err)) => {
                        error!(generation = %id, error = %err, "buffer rejected output; abandoning run");
                        return RunOutcome::BufferFailed;
                    }
                    None => {
                        debug!(generation = %id, ?pid, "superseded while streaming");
                        wind_down(id, &mut child, &mut kills).await;
                        return RunOutcome::Superseded;
                    }
                },
                Err(err) => {
                    warn!(generation = %id, error = %err, "reading command output failed");
                    ctx.report(id, &format!("(read from exec: {err})"));
                    break;
                }
            },
        }
    }
    drop(output);

    let status = tokio::select! {
        biased;

        Some(reply) = kills.recv() => {
            serve_kill(id, &mut child, reply).await;
            return RunOutcome::Superseded;
        }

        status = child.wait() => status,
    };

    let outcome = match status {
        Ok(status) => {
            info!(generation = %id, ?pid, %status, "command exited");
            if !status.success() {
                ctx.report(id, &exit_diagnostic(status));
            }
            RunOutcome::Exited {
                success: status.success(),
            }
        }
        Err(err) => {
            warn!(generation = %id, ?pid, error = %err, "waiting for command failed");
            ctx.report(id, &format!("wait for command to exit: {err}"));
            RunOutcome::WaitFailed
        }
    };

    ctx.settle(id);
    outcome
}

fn exit_diagnostic(status: ExitStatus) -> String {
    format!("command failed: {status}")
}

/// Kill on behalf of the launcher, answer it, and reap.
async fn serve_kill(id: Generation, child: &mut Child, reply: KillReply) {
    debug!(generation = %id, pid = ?child.id(), "kill requested by launcher");
    let result = child.start_kill();
    let _ = reply.send(result);
    let _ = child.wait().await;
}

/// A newer generation exists but its launcher may not have asked for the
/// kill yet. Wait for that request (or for the handle to go away), make sure
/// the process is dead, and reap it.
async fn wind_down(id: Generation, child: &mut Child, kills: &mut KillRequests) {
    match kills.recv().await {
        Some(reply) => serve_kill(id, child, reply).await,
        None => {
            if let Err(err) = kill_child(child) {
                warn!(generation = %id, error = %err, "failed to kill superseded process");
            }
            let _ = child.wait().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;
    use crate::supervisor::ShellCommand;

    fn ctx(buffer: MemoryBuffer) -> RunContext<MemoryBuffer> {
        RunContext {
            registry: Arc::new(Registry::new()),
            buffer: Arc::new(buffer),
            options: Arc::new(RunOptions {
                shell: ShellCommand::new("sh", ["-c"]),
                chunk_size: 16,
            }),
        }
    }

    #[tokio::test]
    async fn failing_command_reports_exit_and_settles() {
        let buffer = MemoryBuffer::new("exit 3");
        let ctx = ctx(buffer.clone());
        let id = ctx.registry.advance().generation;

        let outcome = execute(ctx.clone(), id, "echo partial; exit 3".to_string()).await;

        assert_eq!(outcome, RunOutcome::Exited { success: false });
        assert_eq!(buffer.output(), "partial\ncommand failed: exit status: 3\n");
        assert_eq!(buffer.settle_count(), 1);
        assert!(!ctx.registry.has_process());
    }

    #[tokio::test]
    async fn small_chunks_are_streamed_in_order() {
        let buffer = MemoryBuffer::new("seq");
        let ctx = ctx(buffer.clone());
        let id = ctx.registry.advance().generation;

        let outcome = execute(ctx, id, "seq 1 50".to_string()).await;

        assert_eq!(outcome, RunOutcome::Exited { success: true });
        let expected: String = (1..=50).map(|i| format!("{i}\n")).collect();
        assert_eq!(buffer.output(), expected);
        assert!(buffer.appends().len() > 1);
        assert_eq!(buffer.visible_count(), buffer.appends().len());
    }

    #[tokio::test]
    async fn stale_generation_loses_race_without_writing() {
        let buffer = MemoryBuffer::new("echo nope");
        let ctx = ctx(buffer.clone());
        let id = ctx.registry.advance().generation;
        ctx.registry.advance();

        let outcome = execute(ctx, id, "echo nope".to_string()).await;

        assert_eq!(outcome, RunOutcome::LostRace);
        assert!(buffer.appends().is_empty());
        assert_eq!(buffer.settle_count(), 0);
    }

    #[tokio::test]
    async fn stale_generation_kills_its_own_process() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("survived");
        let command = format!("sleep 1; touch {}", marker.display());

        let buffer = MemoryBuffer::new(command.clone());
        let ctx = ctx(buffer.clone());
        let id = ctx.registry.advance().generation;
        ctx.registry.advance();

        let outcome = execute(ctx, id, command).await;
        assert_eq!(outcome, RunOutcome::LostRace);

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "lost-race process must be killed before it finishes");
        assert!(buffer.appends().is_empty());
    }
}
