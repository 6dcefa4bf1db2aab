// src/lib.rs

pub mod buffer;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod session;
pub mod supervisor;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::buffer::TerminalBuffer;
use crate::cli::CliArgs;
use crate::config::{default_config_path, resolve_config, ConfigFile};
use crate::session::input::{spawn_ctrl_c, spawn_stdin_reader};
use crate::session::{Session, SessionEvent};
use crate::supervisor::{Launcher, Registry};
use crate::watch::{spawn_watcher, WatchPatterns};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the terminal buffer and the run supervisor
/// - stdin, Ctrl-C and (optional) file watch triggers
/// - the session loop
pub async fn run(args: CliArgs) -> Result<()> {
    let command = args.command_line()?;

    let mut raw = resolve_config(args.config.as_deref(), &default_config_path())?;
    args.apply_to(&mut raw);
    let cfg = ConfigFile::try_from(raw)?;

    if args.dry_run {
        print_dry_run(&command, &cfg);
        return Ok(());
    }

    let buffer = Arc::new(TerminalBuffer::stdout(command, cfg.run.clear_screen));
    let registry = Arc::new(Registry::new());
    let launcher = Launcher::new(registry, buffer, cfg.run_options());

    let (tx, rx) = mpsc::channel::<SessionEvent>(64);

    // Optional file watcher; kept alive until the session ends.
    let _watcher_handle = if cfg.watch_enabled() {
        let patterns = WatchPatterns::new(&cfg.watch.paths, &cfg.watch.exclude)?;
        Some(spawn_watcher(
            watch_root(),
            patterns,
            cfg.watch.use_hash,
            cfg.watch.debounce(),
            tx.clone(),
        )?)
    } else {
        None
    };

    spawn_ctrl_c(tx.clone());
    spawn_stdin_reader(tx);

    info!(auto = cfg.session.auto, "starting session");
    Session::new(launcher, rx, cfg.session.auto).run().await?;
    Ok(())
}

fn watch_root() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Simple dry-run output: print the command and the effective settings.
fn print_dry_run(command: &str, cfg: &ConfigFile) {
    let options = cfg.run_options();
    println!("relaunch dry-run");
    println!("  command = {command}");
    println!(
        "  shell = {} {}",
        options.shell.program,
        options.shell.args.join(" ")
    );
    println!("  chunk_size = {}", options.chunk_size);
    println!("  clear_screen = {}", cfg.run.clear_screen);
    println!("  auto = {}", cfg.session.auto);
    if cfg.watch_enabled() {
        println!("  watch = {:?}", cfg.watch.paths);
        if !cfg.watch.exclude.is_empty() {
            println!("  exclude = {:?}", cfg.watch.exclude);
        }
        println!("  use_hash = {}", cfg.watch.use_hash);
        println!("  debounce_ms = {}", cfg.watch.debounce_ms);
    }

    debug!("dry-run complete (no execution)");
}
