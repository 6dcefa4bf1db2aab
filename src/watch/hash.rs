// src/watch/hash.rs

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Compute the hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = File::open(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last seen content hash per file, kept in memory for the session.
#[derive(Debug, Default)]
pub struct ContentHashes {
    map: HashMap<PathBuf, String>,
}

impl ContentHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current contents of `path` and report whether they differ
    /// from the last time it was seen.
    ///
    /// A file that cannot be read (typically: it was removed) counts as
    /// changed and is forgotten.
    pub fn changed(&mut self, path: &Path) -> bool {
        match compute_file_hash(path) {
            Ok(hash) => {
                let previous = self.map.insert(path.to_path_buf(), hash.clone());
                let changed = previous.as_deref() != Some(hash.as_str());
                debug!(?path, hash = %hash, changed, "hashed watched file");
                changed
            }
            Err(err) => {
                debug!(?path, error = %err, "watched file unreadable; treating as changed");
                self.map.remove(path).is_some() || !path.exists()
            }
        }
    }

    /// Seed the store so the first real save is compared against the
    /// contents at startup rather than always counting as a change.
    pub fn remember(&mut self, path: &Path) {
        if let Ok(hash) = compute_file_hash(path) {
            self.map.insert(path.to_path_buf(), hash);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn identical_rewrite_is_not_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "one").unwrap();

        let mut hashes = ContentHashes::new();
        hashes.remember(&file);
        assert!(!hashes.changed(&file));

        fs::write(&file, "two").unwrap();
        assert!(hashes.changed(&file));
        assert!(!hashes.changed(&file));
    }

    #[test]
    fn removed_file_counts_as_changed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("gone.txt");
        fs::write(&file, "x").unwrap();

        let mut hashes = ContentHashes::new();
        hashes.remember(&file);
        fs::remove_file(&file).unwrap();
        assert!(hashes.changed(&file));
    }
}
