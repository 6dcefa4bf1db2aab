#![allow(dead_code, unused_imports)]

use std::sync::Arc;

use relaunch::buffer::MemoryBuffer;
use relaunch::supervisor::{Launcher, Registry, RunOptions, ShellCommand};

pub use relaunch_test_utils::{init_tracing, wait_for, with_timeout};

/// Options that only rely on a POSIX `sh`.
pub fn sh_options() -> RunOptions {
    RunOptions {
        shell: ShellCommand::new("sh", ["-c"]),
        ..RunOptions::default()
    }
}

/// Launcher over a fresh registry and the given memory buffer.
pub fn launcher(buffer: &MemoryBuffer) -> Launcher<MemoryBuffer> {
    Launcher::new(
        Arc::new(Registry::new()),
        Arc::new(buffer.clone()),
        sh_options(),
    )
}
