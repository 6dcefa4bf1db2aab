// src/supervisor/process.rs

//! Spawning commands with merged output, and the kill handshake.
//!
//! The `tokio::process::Child` never leaves the executor that spawned it:
//! the executor has to keep reading its output and eventually reap it. What
//! the registry stores instead is a [`ProcessHandle`], a one-shot kill
//! capability addressed to that executor. Killing through the handle makes
//! the executor deliver the OS-level kill and report the result back, so the
//! killer can tell "already exited" apart from a real failure.

use std::io;
use std::os::fd::OwnedFd;
use std::process::Stdio;

use thiserror::Error;
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::debug;

use super::{Generation, ShellCommand};

/// Reply channel carried by a kill request.
pub type KillReply = oneshot::Sender<io::Result<()>>;

/// What happened to a process we asked to kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    Killed,
    AlreadyExited,
}

/// Kill capability for the process of one generation.
#[derive(Debug)]
pub struct ProcessHandle {
    generation: Generation,
    pid: Option<u32>,
    kill_tx: oneshot::Sender<KillReply>,
}

/// Executor side of a [`ProcessHandle`].
#[derive(Debug)]
pub struct KillRequests {
    rx: Option<oneshot::Receiver<KillReply>>,
}

impl ProcessHandle {
    pub fn new(generation: Generation, pid: Option<u32>) -> (Self, KillRequests) {
        let (kill_tx, rx) = oneshot::channel();
        (
            Self {
                generation,
                pid,
                kill_tx,
            },
            KillRequests { rx: Some(rx) },
        )
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the owning executor to kill the process and wait for the result.
    ///
    /// An executor that already finished (and so dropped its end) counts as
    /// "already exited", as does an OS report that there is nothing to kill.
    pub async fn kill(self) -> io::Result<KillOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.kill_tx.send(reply_tx).is_err() {
            return Ok(KillOutcome::AlreadyExited);
        }
        match reply_rx.await {
            Ok(Ok(())) => Ok(KillOutcome::Killed),
            Ok(Err(err)) if is_already_exited(&err) => Ok(KillOutcome::AlreadyExited),
            Ok(Err(err)) => Err(err),
            Err(_) => Ok(KillOutcome::AlreadyExited),
        }
    }
}

impl KillRequests {
    /// Wait for the next kill request. Returns `None` once the handle is gone
    /// or a request was already received.
    ///
    /// Cancel safe: a request is never lost if this future is dropped.
    pub async fn recv(&mut self) -> Option<KillReply> {
        let rx = self.rx.as_mut()?;
        let reply = rx.await.ok();
        self.rx = None;
        reply
    }
}

/// Whether a kill error only means the process is already gone.
pub fn is_already_exited(err: &io::Error) -> bool {
    // ESRCH
    err.kind() == io::ErrorKind::InvalidInput || err.raw_os_error() == Some(3)
}

/// Send an OS-level kill to `child` without waiting for it to exit.
pub fn kill_child(child: &mut Child) -> io::Result<KillOutcome> {
    match child.start_kill() {
        Ok(()) => Ok(KillOutcome::Killed),
        Err(err) if is_already_exited(&err) => Ok(KillOutcome::AlreadyExited),
        Err(err) => Err(err),
    }
}

/// Failure to get a command running.
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("make pipe: {0}")]
    Pipe(#[source] io::Error),

    #[error("start command: {0}")]
    Start(#[source] io::Error),
}

/// A started command and the read end of its merged stdout/stderr pipe.
#[derive(Debug)]
pub struct SpawnedProcess {
    pub child: Child,
    pub output: pipe::Receiver,
}

/// Start `command` through `shell`, with stdout and stderr sharing one pipe.
///
/// The parent's copies of the write end are dropped before returning, so the
/// reader sees end-of-stream once the child and its descendants close theirs.
pub fn spawn_merged(shell: &ShellCommand, command: &str) -> Result<SpawnedProcess, SpawnError> {
    let (reader, writer) = io::pipe().map_err(SpawnError::Pipe)?;
    let stderr_writer = writer.try_clone().map_err(SpawnError::Pipe)?;

    let child = {
        let mut cmd = Command::new(&shell.program);
        cmd.args(&shell.args)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer)
            .kill_on_drop(true);
        cmd.spawn().map_err(SpawnError::Start)?
        // `cmd` and with it both write ends are dropped here.
    };

    debug!(pid = ?child.id(), shell = %shell.program, "spawned command");

    let output = pipe::Receiver::from_owned_fd(OwnedFd::from(reader)).map_err(SpawnError::Pipe)?;
    Ok(SpawnedProcess { child, output })
}
