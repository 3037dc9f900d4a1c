//! Chunk Builder: whole-corpus ingestion from the source document directory.
//!
//! For each source document: extract text, split into overlapping chunks,
//! drop chunks below the quality floor, flag (and exclude) chunks matching
//! the policy denylist, and stage the survivors. The staged chunk set
//! replaces the live store atomically at the end of the run, so a failed
//! run leaves the previous corpus in place.
//!
//! Flagged chunks are a human-in-the-loop safety valve: they are logged for
//! manual review, never silently corrected.

use anyhow::{Context, Result};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::chunker::split_text;
use crate::config::Config;
use crate::extract::{extract_text, is_source_document};
use crate::models::{Chunk, IngestReport};
use crate::store::ChunkStore;

pub fn run_ingest(config: &Config) -> Result<IngestReport> {
    let source_dir = &config.store.source_dir;
    if !source_dir.exists() {
        anyhow::bail!("Source directory does not exist: {}", source_dir.display());
    }

    let store = ChunkStore::new(&config.store.chunk_dir);
    let rebuild = store.begin_rebuild()?;
    let mut report = IngestReport::default();

    let mut files: Vec<_> = WalkDir::new(source_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_source_document(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    for path in &files {
        let origin = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };

        let text = match extract_text(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping document {}: {}", path.display(), e);
                report.documents_skipped += 1;
                continue;
            }
        };

        info!("Processing {}", path.display());
        let pieces = split_text(&text, config.chunking.chunk_size, config.chunking.chunk_overlap);

        for (i, piece) in pieces.iter().enumerate() {
            let trimmed = piece.trim();
            if trimmed.chars().count() <= config.chunking.min_chunk_chars {
                report.chunks_discarded += 1;
                continue;
            }

            if let Some(phrase) = matching_disallowed_phrase(trimmed, config) {
                warn!(
                    "Flagged chunk {}_chunk{} for manual review (matched '{}')",
                    origin, i, phrase
                );
                report.chunks_flagged += 1;
                continue;
            }

            let chunk = Chunk::new(&origin, i, trimmed);
            rebuild
                .write_chunk(&chunk)
                .with_context(|| format!("Failed to stage chunk {}", chunk.source_key()))?;
            report.chunks_written += 1;
        }

        report.documents_processed += 1;
    }

    rebuild.commit()?;
    info!(
        "Ingestion complete: {} chunks written, {} flagged, {} discarded",
        report.chunks_written, report.chunks_flagged, report.chunks_discarded
    );

    Ok(report)
}

fn matching_disallowed_phrase<'a>(content: &str, config: &'a Config) -> Option<&'a str> {
    let lowered = content.to_lowercase();
    config
        .chunking
        .disallowed_phrases
        .iter()
        .find(|phrase| lowered.contains(&phrase.to_lowercase()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use std::path::Path;

    fn test_config(root: &Path) -> Config {
        Config {
            store: StoreConfig {
                source_dir: root.join("source_docs"),
                chunk_dir: root.join("jtr_chunks"),
            },
            chunking: ChunkingConfig::default(),
            index: IndexConfig {
                dir: root.join("vectordb"),
            },
            retrieval: RetrievalConfig::default(),
            synthesis: SynthesisConfig::default(),
            gate: GateConfig::default(),
            embedding: EmbeddingConfig {
                endpoint: "http://127.0.0.1:11434".to_string(),
                model: "all-minilm".to_string(),
                dims: 384,
                batch_size: 32,
                max_retries: 5,
                timeout_secs: 30,
            },
            generation: GenerationConfig {
                endpoint: "http://127.0.0.1:11434".to_string(),
                model: "flan-t5-base".to_string(),
                max_new_tokens: 256,
                timeout_secs: 120,
            },
            server: ServerConfig::default(),
            audit: AuditConfig {
                question_log: root.join("sample_questions.txt"),
            },
        }
    }

    fn long_paragraph(topic: &str) -> String {
        format!(
            "{} entitlements are governed by the Joint Travel Regulations. \
             Reimbursement requires itemized receipts for lodging and a \
             completed travel voucher submitted within five working days of \
             return. Locality per diem rates apply to the duty location.",
            topic
        )
    }

    #[test]
    fn ingest_writes_quality_chunks() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        std::fs::create_dir_all(&config.store.source_dir).unwrap();
        std::fs::write(
            config.store.source_dir.join("jtr.txt"),
            format!("{}\n\n{}", long_paragraph("Lodging"), long_paragraph("Mileage")),
        )
        .unwrap();

        let report = run_ingest(&config).unwrap();
        assert_eq!(report.documents_processed, 1);
        assert!(report.chunks_written >= 1);

        let chunks = ChunkStore::new(&config.store.chunk_dir).load_all().unwrap();
        assert_eq!(chunks.len(), report.chunks_written);
        for chunk in &chunks {
            assert!(chunk.content.trim().chars().count() > 100);
            assert_eq!(chunk.origin, "jtr");
        }
    }

    #[test]
    fn quality_floor_counts_characters_not_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        std::fs::create_dir_all(&config.store.source_dir).unwrap();
        // 80 characters but 160 bytes: still below the 100-character floor.
        std::fs::write(config.store.source_dir.join("accented.txt"), "é".repeat(80)).unwrap();

        let report = run_ingest(&config).unwrap();
        assert_eq!(report.chunks_written, 0);
        assert_eq!(report.chunks_discarded, 1);
    }

    #[test]
    fn short_chunks_are_discarded() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        std::fs::create_dir_all(&config.store.source_dir).unwrap();
        std::fs::write(config.store.source_dir.join("stub.txt"), "Too short to keep.").unwrap();

        let report = run_ingest(&config).unwrap();
        assert_eq!(report.chunks_written, 0);
        assert_eq!(report.chunks_discarded, 1);
    }

    #[test]
    fn disallowed_phrases_are_flagged_not_written() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        std::fs::create_dir_all(&config.store.source_dir).unwrap();
        let bad = format!(
            "Members are always entitled to full reimbursement regardless of \
             receipts, and {}",
            long_paragraph("POV")
        );
        std::fs::write(config.store.source_dir.join("bad.txt"), bad).unwrap();

        let report = run_ingest(&config).unwrap();
        assert!(report.chunks_flagged >= 1);

        let chunks = ChunkStore::new(&config.store.chunk_dir).load_all().unwrap();
        for chunk in &chunks {
            assert!(!chunk.content.to_lowercase().contains("always entitled"));
        }
    }

    #[test]
    fn extraction_failure_skips_document_and_continues() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        std::fs::create_dir_all(&config.store.source_dir).unwrap();
        std::fs::write(config.store.source_dir.join("corrupt.pdf"), b"not a pdf").unwrap();
        std::fs::write(
            config.store.source_dir.join("good.txt"),
            long_paragraph("Dependent"),
        )
        .unwrap();

        let report = run_ingest(&config).unwrap();
        assert_eq!(report.documents_skipped, 1);
        assert_eq!(report.documents_processed, 1);
        assert!(report.chunks_written >= 1);
    }

    #[test]
    fn ingest_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        std::fs::create_dir_all(&config.store.source_dir).unwrap();
        std::fs::write(
            config.store.source_dir.join("jtr.txt"),
            format!("{}\n\n{}", long_paragraph("Lodging"), long_paragraph("Rental")),
        )
        .unwrap();

        let first = run_ingest(&config).unwrap();
        let chunks_a = ChunkStore::new(&config.store.chunk_dir).load_all().unwrap();
        let second = run_ingest(&config).unwrap();
        let chunks_b = ChunkStore::new(&config.store.chunk_dir).load_all().unwrap();

        assert_eq!(first, second);
        assert_eq!(chunks_a, chunks_b);
    }

    #[test]
    fn source_keys_are_unique() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        std::fs::create_dir_all(&config.store.source_dir).unwrap();
        let body = (0..8)
            .map(|i| long_paragraph(&format!("Topic{}", i)))
            .collect::<Vec<_>>()
            .join("\n\n");
        std::fs::write(config.store.source_dir.join("jtr.txt"), body).unwrap();

        run_ingest(&config).unwrap();
        let chunks = ChunkStore::new(&config.store.chunk_dir).load_all().unwrap();
        let mut keys: Vec<String> = chunks.iter().map(Chunk::source_key).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }
}
