//! Core data types for the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// Maximum length of a derived display label.
const MAX_LABEL_CHARS: usize = 100;

/// A bounded span of regulation text; the atomic retrievable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier of the source document this chunk came from (filename stem).
    pub origin: String,
    /// Sequence index within the origin document.
    pub index: usize,
    /// The chunk text.
    pub content: String,
}

impl Chunk {
    pub fn new(origin: impl Into<String>, index: usize, content: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            index,
            content: content.into(),
        }
    }

    /// Persistent unique key, `{origin}_chunk{index}`.
    pub fn source_key(&self) -> String {
        format!("{}_chunk{}", self.origin, self.index)
    }

    /// Display label: first non-empty line, truncated, or `"Unknown"`.
    pub fn label(&self) -> String {
        let first_line = self
            .content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty());
        match first_line {
            Some(line) => line.chars().take(MAX_LABEL_CHARS).collect(),
            None => "Unknown".to_string(),
        }
    }
}

/// Parse a source key back into `(origin, index)`.
///
/// The origin itself may contain underscores, so the split happens at the
/// last `_chunk` marker.
pub fn parse_source_key(key: &str) -> Option<(String, usize)> {
    let pos = key.rfind("_chunk")?;
    let origin = &key[..pos];
    let index: usize = key[pos + "_chunk".len()..].parse().ok()?;
    if origin.is_empty() {
        return None;
    }
    Some((origin.to_string(), index))
}

/// A chunk returned by the retriever, with its similarity score.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Counters reported by one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents_processed: usize,
    pub documents_skipped: usize,
    pub chunks_written: usize,
    pub chunks_flagged: usize,
    pub chunks_discarded: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_key_format() {
        let chunk = Chunk::new("jtr_2025", 7, "text");
        assert_eq!(chunk.source_key(), "jtr_2025_chunk7");
    }

    #[test]
    fn parse_source_key_roundtrip() {
        let chunk = Chunk::new("dafi_36_3003", 12, "text");
        let (origin, index) = parse_source_key(&chunk.source_key()).unwrap();
        assert_eq!(origin, "dafi_36_3003");
        assert_eq!(index, 12);
    }

    #[test]
    fn parse_source_key_rejects_garbage() {
        assert!(parse_source_key("no marker here").is_none());
        assert!(parse_source_key("_chunk3").is_none());
        assert!(parse_source_key("jtr_chunkX").is_none());
    }

    #[test]
    fn label_is_first_nonempty_line() {
        let chunk = Chunk::new("jtr", 0, "\n\n  Chapter 2: Per Diem  \nBody text.");
        assert_eq!(chunk.label(), "Chapter 2: Per Diem");
    }

    #[test]
    fn label_sentinel_for_blank_content() {
        let chunk = Chunk::new("jtr", 0, "   \n \n");
        assert_eq!(chunk.label(), "Unknown");
    }

    #[test]
    fn label_is_truncated() {
        let chunk = Chunk::new("jtr", 0, "x".repeat(500));
        assert_eq!(chunk.label().chars().count(), 100);
    }
}
