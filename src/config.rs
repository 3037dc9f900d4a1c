use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub gate: GateConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Directory of source regulation documents (PDF or plain text).
    pub source_dir: PathBuf,
    /// Directory the chunk files are written to.
    pub chunk_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Quality floor: chunks at or below this trimmed length are discarded.
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
    /// Denylist of known-incorrect regulatory claims. Matching chunks are
    /// flagged for manual review and excluded from the store.
    #[serde(default = "default_disallowed_phrases")]
    pub disallowed_phrases: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_chars: default_min_chunk_chars(),
            disallowed_phrases: default_disallowed_phrases(),
        }
    }
}

fn default_chunk_size() -> usize {
    300
}
fn default_chunk_overlap() -> usize {
    30
}
fn default_min_chunk_chars() -> usize {
    100
}
fn default_disallowed_phrases() -> Vec<String> {
    vec![
        "always entitled".to_string(),
        "use LeaveWeb".to_string(),
        "POV always reimbursed".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
        }
    }
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("vectordb")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Number of chunks returned per query.
    #[serde(default = "default_k")]
    pub k: usize,
    /// Which snapshot serves queries: `primary` or `retrain`.
    #[serde(default = "default_active_snapshot")]
    pub active_snapshot: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            active_snapshot: default_active_snapshot(),
        }
    }
}

fn default_k() -> usize {
    3
}
fn default_active_snapshot() -> String {
    "primary".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SynthesisConfig {
    /// Below this many characters of retrieved context, the synthesizer
    /// falls back to the disclaimer form.
    #[serde(default = "default_min_context_chars")]
    pub min_context_chars: usize,
    /// Origin document name -> human display label.
    #[serde(default)]
    pub source_labels: HashMap<String, String>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            min_context_chars: default_min_context_chars(),
            source_labels: HashMap::new(),
        }
    }
}

fn default_min_context_chars() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct GateConfig {
    /// Domain jargon that would otherwise trip the deny patterns. The
    /// allow-list takes precedence over every deny pattern.
    #[serde(default = "default_safe_words")]
    pub safe_words: Vec<String>,
    /// OPSEC keywords matched case-insensitively on word boundaries.
    #[serde(default = "default_opsec_keywords")]
    pub opsec_keywords: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            safe_words: default_safe_words(),
            opsec_keywords: default_opsec_keywords(),
        }
    }
}

fn default_safe_words() -> Vec<String> {
    ["location", "airport", "TDY", "PCS", "JTR", "DAFI"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_opsec_keywords() -> Vec<String> {
    ["classified", "secret", "OPSEC", "grid ref", "coordinates"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding service.
    pub endpoint: String,
    pub model: String,
    pub dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_batch_size() -> usize {
    32
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Base URL of the generation service.
    pub endpoint: String,
    pub model: String,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: usize,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_new_tokens() -> usize {
    256
}
fn default_generation_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuditConfig {
    /// Append-only log of first-seen user questions.
    #[serde(default = "default_question_log")]
    pub question_log: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            question_log: default_question_log(),
        }
    }
}

fn default_question_log() -> PathBuf {
    PathBuf::from("context/sample_questions.txt")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.chunk_overlap must be smaller than chunking.chunk_size");
    }
    if config.retrieval.k == 0 {
        anyhow::bail!("retrieval.k must be >= 1");
    }
    match config.retrieval.active_snapshot.as_str() {
        "primary" | "retrain" => {}
        other => anyhow::bail!(
            "retrieval.active_snapshot must be 'primary' or 'retrain', got '{}'",
            other
        ),
    }
    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }
    if config.embedding.model.is_empty() || config.generation.model.is_empty() {
        anyhow::bail!("embedding.model and generation.model must be set");
    }

    Ok(config)
}
