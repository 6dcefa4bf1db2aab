// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled watch/exclude glob patterns.
///
/// Patterns are relative to the watch root; the watcher passes relative
/// paths (e.g. `"src/main.rs"`) into [`matches`](WatchPatterns::matches).
#[derive(Clone)]
pub struct WatchPatterns {
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchPatterns")
            .field("watch", &self.watch_set.len())
            .field("exclude", &self.exclude_set.as_ref().map(GlobSet::len))
            .finish()
    }
}

impl WatchPatterns {
    pub fn new(watch: &[String], exclude: &[String]) -> Result<Self> {
        let watch_set = build_globset(watch).context("building watch globset")?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };
        Ok(Self {
            watch_set,
            exclude_set,
        })
    }

    /// Returns true if a change to `rel_path` should count.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// `path` relative to `root`, with forward slashes, or `None` if it lies
/// outside `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn pats(watch: &[&str], exclude: &[&str]) -> WatchPatterns {
        let w: Vec<String> = watch.iter().map(|s| s.to_string()).collect();
        let e: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        WatchPatterns::new(&w, &e).unwrap()
    }

    #[test]
    fn exclude_wins_over_watch() {
        let p = pats(&["src/**/*.rs"], &["src/gen/**"]);
        assert!(p.matches("src/main.rs"));
        assert!(p.matches("src/a/b.rs"));
        assert!(!p.matches("src/gen/out.rs"));
        assert!(!p.matches("README.md"));
    }

    #[test]
    fn no_patterns_match_nothing() {
        let p = pats(&[], &[]);
        assert!(!p.matches("anything"));
    }

    #[test]
    fn relative_paths_outside_root_are_none() {
        let root = PathBuf::from("/work/project");
        assert_eq!(
            relative_str(&root, &root.join("src/lib.rs")).as_deref(),
            Some("src/lib.rs")
        );
        assert_eq!(relative_str(&root, Path::new("/etc/passwd")), None);
    }
}
