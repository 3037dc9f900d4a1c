//! On-disk Chunk Store.
//!
//! The store is a flat directory of `{origin}_chunk{index}.txt` files, one
//! per chunk. A rebuild writes the whole new chunk set into a staging
//! directory first and swaps it in with a rename, so an interrupted run
//! never leaves an empty store behind.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::models::{parse_source_key, Chunk};

pub struct ChunkStore {
    dir: PathBuf,
}

impl ChunkStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Start a whole-corpus rebuild. Chunks are written to a staging
    /// directory and only become visible on [`StagedRebuild::commit`].
    pub fn begin_rebuild(&self) -> Result<StagedRebuild> {
        let staging = sibling_dir(&self.dir, "staging");
        if staging.exists() {
            std::fs::remove_dir_all(&staging)
                .with_context(|| format!("Failed to clear stale staging dir {}", staging.display()))?;
        }
        std::fs::create_dir_all(&staging)?;
        Ok(StagedRebuild {
            staging,
            target: self.dir.clone(),
            committed: false,
        })
    }

    /// Load every chunk, ordered by `(origin, index)`.
    ///
    /// Files whose names do not parse as a source key are logged and
    /// skipped; they are not part of the corpus.
    pub fn load_all(&self) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        if !self.dir.exists() {
            return Ok(chunks);
        }

        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(s) => s,
                None => continue,
            };
            let Some((origin, index)) = parse_source_key(stem) else {
                warn!("Skipping unrecognized chunk file: {}", path.display());
                continue;
            };
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read chunk {}", path.display()))?;
            chunks.push(Chunk::new(origin, index, content));
        }

        chunks.sort_by(|a, b| a.origin.cmp(&b.origin).then(a.index.cmp(&b.index)));
        Ok(chunks)
    }

    /// Load only the chunks named by `keys`, preserving the given order.
    ///
    /// Returns the resolved chunks and the keys that were not found; the
    /// caller decides how to report the misses.
    pub fn load_keys(&self, keys: &[String]) -> Result<(Vec<Chunk>, Vec<String>)> {
        let mut chunks = Vec::new();
        let mut missing = Vec::new();

        for key in keys {
            let Some((origin, index)) = parse_source_key(key) else {
                missing.push(key.clone());
                continue;
            };
            let path = self.dir.join(format!("{}.txt", key));
            if !path.exists() {
                missing.push(key.clone());
                continue;
            }
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read chunk {}", path.display()))?;
            chunks.push(Chunk::new(origin, index, content));
        }

        Ok((chunks, missing))
    }
}

/// An in-progress store rebuild. Dropped without commit, the staging
/// directory is removed and the live store is untouched.
pub struct StagedRebuild {
    staging: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedRebuild {
    /// Write one accepted chunk, keyed by its source key. Writing the same
    /// key again overwrites it.
    pub fn write_chunk(&self, chunk: &Chunk) -> Result<()> {
        let path = self.staging.join(format!("{}.txt", chunk.source_key()));
        std::fs::write(&path, &chunk.content)
            .with_context(|| format!("Failed to write chunk {}", path.display()))?;
        Ok(())
    }

    /// Swap the staged chunk set in as the live store.
    pub fn commit(mut self) -> Result<()> {
        let old = sibling_dir(&self.target, "old");
        if old.exists() {
            std::fs::remove_dir_all(&old)?;
        }
        if self.target.exists() {
            std::fs::rename(&self.target, &old)
                .with_context(|| format!("Failed to move old store {}", self.target.display()))?;
        } else if let Some(parent) = self.target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(&self.staging, &self.target)
            .with_context(|| format!("Failed to swap in new store {}", self.target.display()))?;
        if old.exists() {
            // Leftover old store is harmless; removal failure is not fatal.
            if let Err(e) = std::fs::remove_dir_all(&old) {
                warn!("Failed to remove old store {}: {}", old.display(), e);
            }
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedRebuild {
    fn drop(&mut self) {
        if !self.committed && self.staging.exists() {
            let _ = std::fs::remove_dir_all(&self.staging);
        }
    }
}

fn sibling_dir(dir: &Path, suffix: &str) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "chunks".to_string());
    dir.with_file_name(format!("{}.{}", name, suffix))
}
