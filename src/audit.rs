//! Append-only question log.
//!
//! Every query, blocked or answered, is recorded before any other
//! processing so the audit trail survives downstream failures. Each
//! distinct question is logged once; repeats are silently skipped.

use anyhow::{Context, Result};
use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct QuestionLog {
    path: PathBuf,
}

impl QuestionLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a question with a timestamp and the interface it arrived
    /// through. Returns `true` when the question was newly recorded,
    /// `false` when it was already present.
    pub fn record(&self, question: &str, mode: &str) -> Result<bool> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(false);
        }

        let existing = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read question log {}", self.path.display())
                })
            }
        };

        // First-seen wins: the same question text is never logged twice,
        // regardless of mode.
        let marker = format!("Q: {} (", question);
        if existing.contains(&marker) {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open question log {}", self.path.display()))?;
        writeln!(file, "Q: {} (Asked on {}, Mode: {})", question, timestamp, mode)
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;

        Ok(true)
    }
}
