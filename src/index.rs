//! Vector index snapshots.
//!
//! A snapshot is a named directory under the index dir containing a
//! `manifest.json` (model, dims, chunk entries with content hashes) and a
//! `vectors.bin` blob of little-endian f32 embeddings, one row per entry in
//! manifest order. Two named snapshots coexist: the primary index built
//! from the whole Chunk Store, and a retrain index built from an explicitly
//! flagged subset of source keys. Rebuilding is whole-snapshot replacement;
//! retrain never merges into primary.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob, Embedder};
use crate::models::{Chunk, RetrievedChunk};
use crate::store::ChunkStore;

/// Snapshot name for the full-corpus index.
pub const PRIMARY_INDEX_NAME: &str = "travelbot";
/// Snapshot name for the flagged-subset retrain index.
pub const RETRAIN_INDEX_NAME: &str = "travelbot_retrain";

const MANIFEST_FILE: &str = "manifest.json";
const VECTORS_FILE: &str = "vectors.bin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    All,
    Retrain,
}

impl IndexMode {
    pub fn snapshot_name(self) -> &'static str {
        match self {
            IndexMode::All => PRIMARY_INDEX_NAME,
            IndexMode::Retrain => RETRAIN_INDEX_NAME,
        }
    }
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("no chunks resolved for index build; nothing to embed")]
    EmptyCorpus,
    #[error("index snapshot '{0}' not found")]
    SnapshotMissing(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    name: String,
    model: String,
    dims: usize,
    created_at: String,
    entries: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestEntry {
    source_key: String,
    origin: String,
    index: usize,
    text: String,
    hash: String,
}

/// An in-memory index snapshot supporting similarity search.
#[derive(Debug)]
pub struct VectorIndex {
    name: String,
    model: String,
    dims: usize,
    entries: Vec<ManifestEntry>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Embed `chunks` and assemble a fresh snapshot.
    ///
    /// Fails with [`IndexError::EmptyCorpus`] when there is nothing to
    /// embed; no snapshot is produced in that case.
    pub async fn build(
        name: &str,
        chunks: &[Chunk],
        embedder: &dyn Embedder,
        batch_size: usize,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyCorpus.into());
        }

        let dims = embedder.dims();
        let mut vectors = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let batch_vectors = embedder.embed(&texts).await?;
            for vec in &batch_vectors {
                if vec.len() != dims {
                    bail!(
                        "Embedding dims mismatch: expected {}, got {}",
                        dims,
                        vec.len()
                    );
                }
            }
            vectors.extend(batch_vectors);
        }

        let entries = chunks
            .iter()
            .map(|chunk| ManifestEntry {
                source_key: chunk.source_key(),
                origin: chunk.origin.clone(),
                index: chunk.index,
                text: chunk.content.clone(),
                hash: hash_text(&chunk.content),
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            model: embedder.model_name().to_string(),
            dims,
            entries,
            vectors,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the snapshot under `index_dir/<name>/`, replacing any prior
    /// snapshot of the same name. The new snapshot is fully built in a
    /// staging directory before the swap.
    pub fn save(&self, index_dir: &Path) -> Result<PathBuf> {
        let target = index_dir.join(&self.name);
        let staging = index_dir.join(format!("{}.staging", self.name));
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }
        std::fs::create_dir_all(&staging)?;

        let manifest = Manifest {
            name: self.name.clone(),
            model: self.model.clone(),
            dims: self.dims,
            created_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            entries: self
                .entries
                .iter()
                .map(|e| ManifestEntry {
                    source_key: e.source_key.clone(),
                    origin: e.origin.clone(),
                    index: e.index,
                    text: e.text.clone(),
                    hash: e.hash.clone(),
                })
                .collect(),
        };

        let manifest_json = serde_json::to_string_pretty(&manifest)?;
        std::fs::write(staging.join(MANIFEST_FILE), manifest_json)?;

        let mut blob = Vec::with_capacity(self.vectors.len() * self.dims * 4);
        for vec in &self.vectors {
            blob.extend_from_slice(&vec_to_blob(vec));
        }
        std::fs::write(staging.join(VECTORS_FILE), blob)?;

        if target.exists() {
            std::fs::remove_dir_all(&target)
                .with_context(|| format!("Failed to remove old snapshot {}", target.display()))?;
        }
        std::fs::rename(&staging, &target)
            .with_context(|| format!("Failed to swap in snapshot {}", target.display()))?;

        Ok(target)
    }

    /// Load a named snapshot from disk.
    pub fn load(index_dir: &Path, name: &str) -> Result<Self> {
        let dir = index_dir.join(name);
        if !dir.exists() {
            return Err(IndexError::SnapshotMissing(name.to_string()).into());
        }

        let manifest_json = std::fs::read_to_string(dir.join(MANIFEST_FILE))
            .with_context(|| format!("Failed to read manifest for snapshot '{}'", name))?;
        let manifest: Manifest = serde_json::from_str(&manifest_json)
            .with_context(|| format!("Invalid manifest for snapshot '{}'", name))?;

        let blob = std::fs::read(dir.join(VECTORS_FILE))
            .with_context(|| format!("Failed to read vectors for snapshot '{}'", name))?;

        let row_bytes = manifest.dims * 4;
        if row_bytes == 0 || blob.len() != manifest.entries.len() * row_bytes {
            bail!(
                "Corrupt snapshot '{}': {} vector bytes for {} entries of {} dims",
                name,
                blob.len(),
                manifest.entries.len(),
                manifest.dims
            );
        }

        let vectors: Vec<Vec<f32>> = blob.chunks_exact(row_bytes).map(blob_to_vec).collect();

        Ok(Self {
            name: manifest.name,
            model: manifest.model,
            dims: manifest.dims,
            entries: manifest.entries,
            vectors,
        })
    }

    /// Top-k chunks by cosine similarity to `query_vec`, highest first.
    /// Ties break by insertion order. An empty index yields an empty list.
    pub fn search(&self, query_vec: &[f32], k: usize) -> Vec<RetrievedChunk> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, vec)| (i, cosine_similarity(query_vec, vec)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| {
                let entry = &self.entries[i];
                RetrievedChunk {
                    chunk: Chunk::new(entry.origin.clone(), entry.index, entry.text.clone()),
                    score,
                }
            })
            .collect()
    }
}

/// Build and persist a snapshot from the Chunk Store.
///
/// Mode `all` loads the whole store; mode `retrain` loads only the flagged
/// source keys, logging and skipping any key absent from the store.
pub async fn run_build_index(
    config: &Config,
    mode: IndexMode,
    flagged_keys: &[String],
    embedder: &dyn Embedder,
) -> Result<()> {
    let store = ChunkStore::new(&config.store.chunk_dir);

    let chunks = match mode {
        IndexMode::All => store.load_all()?,
        IndexMode::Retrain => {
            let (chunks, missing) = store.load_keys(flagged_keys)?;
            for key in &missing {
                warn!("Flagged chunk not found in store, skipping: {}", key);
            }
            chunks
        }
    };

    let name = mode.snapshot_name();
    info!("Building index snapshot '{}' from {} chunks", name, chunks.len());

    let index = VectorIndex::build(name, &chunks, embedder, config.embedding.batch_size).await?;
    let path = index.save(&config.index.dir)?;

    println!("index build");
    println!("  snapshot: {}", name);
    println!("  chunks embedded: {}", index.len());
    println!("  written to: {}", path.display());
    println!("ok");

    Ok(())
}

fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
