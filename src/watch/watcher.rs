// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::session::SessionEvent;
use crate::watch::hash::ContentHashes;
use crate::watch::patterns::{relative_str, WatchPatterns};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and send one `SessionEvent::FileChanged` per
/// burst of relevant changes.
///
/// - `patterns` decide which relative paths count.
/// - With `use_hash`, a path only counts if its contents changed.
/// - Events arriving within `debounce` of each other are merged.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    patterns: WatchPatterns,
    use_hash: bool,
    debounce: Duration,
    session_tx: mpsc::Sender<SessionEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("relaunch: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("relaunch: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("watching {:?}", root))?;

    info!("file watcher started on {:?}", root);

    let mut hashes = ContentHashes::new();
    if use_hash {
        for path in collect_matching_files(&root, &patterns) {
            hashes.remember(&path);
        }
    }

    tokio::spawn(async move {
        while let Some(first) = event_rx.recv().await {
            let mut batch = vec![first];
            while let Ok(Some(next)) = timeout(debounce, event_rx.recv()).await {
                batch.push(next);
            }

            let changed = filter_changes(&root, &patterns, use_hash.then_some(&mut hashes), batch);
            if changed.is_empty() {
                continue;
            }

            debug!(?changed, "watched files changed");
            if session_tx.send(SessionEvent::FileChanged(changed)).await.is_err() {
                // The session is gone; nothing left to notify.
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Reduce a burst of notify events to the sorted, de-duplicated set of
/// relevant paths.
pub fn filter_changes(
    root: &Path,
    patterns: &WatchPatterns,
    mut hashes: Option<&mut ContentHashes>,
    events: Vec<Event>,
) -> Vec<PathBuf> {
    let paths: BTreeSet<PathBuf> = events
        .into_iter()
        .filter(|e| !matches!(e.kind, EventKind::Access(_)))
        .flat_map(|e| e.paths)
        .collect();

    paths
        .into_iter()
        .filter(|path| match relative_str(root, path) {
            Some(rel) => patterns.matches(&rel),
            None => {
                warn!("could not relativize path {:?} against root {:?}", path, root);
                false
            }
        })
        .filter(|path| match hashes.as_deref_mut() {
            Some(store) => store.changed(path),
            None => true,
        })
        .collect()
}

/// Collect all files under `root` that match `patterns`.
fn collect_matching_files(root: &Path, patterns: &WatchPatterns) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(?dir, error = %err, "skipping unreadable directory");
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if let Some(rel) = relative_str(root, &path) {
                if patterns.matches(&rel) {
                    files.push(path);
                }
            }
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    fn event(kind: EventKind, path: PathBuf) -> Event {
        Event::new(kind).add_path(path)
    }

    #[test]
    fn burst_is_filtered_and_deduplicated() {
        let root = PathBuf::from("/proj");
        let patterns = WatchPatterns::new(&["**/*.rs".to_string()], &["target/**".to_string()]).unwrap();
        let events = vec![
            event(EventKind::Modify(ModifyKind::Any), root.join("src/a.rs")),
            event(EventKind::Modify(ModifyKind::Any), root.join("src/a.rs")),
            event(EventKind::Create(CreateKind::File), root.join("target/x.rs")),
            event(EventKind::Access(AccessKind::Any), root.join("src/b.rs")),
            event(EventKind::Modify(ModifyKind::Any), root.join("notes.txt")),
        ];

        let changed = filter_changes(&root, &patterns, None, events);
        assert_eq!(changed, vec![root.join("src/a.rs")]);
    }

    #[test]
    fn unchanged_contents_are_dropped_with_hashing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let file = root.join("a.txt");
        fs::write(&file, "same").unwrap();

        let patterns = WatchPatterns::new(&["*.txt".to_string()], &[]).unwrap();
        let mut hashes = ContentHashes::new();
        for path in collect_matching_files(&root, &patterns) {
            hashes.remember(&path);
        }

        let touch = || vec![event(EventKind::Modify(ModifyKind::Any), file.clone())];
        assert!(filter_changes(&root, &patterns, Some(&mut hashes), touch()).is_empty());

        fs::write(&file, "different").unwrap();
        assert_eq!(
            filter_changes(&root, &patterns, Some(&mut hashes), touch()),
            vec![file.clone()]
        );
    }
}
