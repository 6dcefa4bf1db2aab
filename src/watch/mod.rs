// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `watch` / `exclude` glob patterns.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Optionally hashing file contents so saves that do not change anything
//!   do not re-run the command.
//!
//! It knows nothing about generations; it only turns bursts of filesystem
//! changes into `SessionEvent::FileChanged`.

pub mod hash;
pub mod patterns;
pub mod watcher;

pub use hash::{compute_file_hash, ContentHashes};
pub use patterns::{relative_str, WatchPatterns};
pub use watcher::{spawn_watcher, WatcherHandle};
