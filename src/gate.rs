//! Sensitivity Gate: heuristic PII/OPSEC screening for user queries.
//!
//! One consolidated, versioned pattern table replaces the per-entry-point
//! copies that tend to drift apart. The gate is a pure predicate: no I/O,
//! no mutation, no logging. Callers decide what to do with the verdict.
//!
//! Detection is deliberately conservative: the capitalized-name heuristic
//! trades false positives for recall, and creatively formatted sensitive
//! data will slip through. This is a best-effort gate, not a compliance
//! control.

use anyhow::Result;
use regex::Regex;

use crate::config::GateConfig;

/// Fixed deny-pattern shapes, matched case-insensitively (v1 table).
const DENY_PATTERNS: [&str; 5] = [
    r"(?i)\b\d{3}-\d{2}-\d{4}\b",        // SSN-like
    r"(?i)\b\d{10}\b",                   // bare 10-digit phone number
    r"(?i)\(\d{3}\)\s*\d{3}-\d{4}",      // (123) 456-7890
    r"(?i)\b\d{2}[-/]\d{2}[-/]\d{4}\b",  // DOB-like date
    r"(?i)\b[A-Z]{2,6}\d{4,7}\b",        // DoD ID or tail number
];

pub struct SensitivityGate {
    safe_words: Vec<String>,
    patterns: Vec<Regex>,
    capitalized: Regex,
}

impl SensitivityGate {
    pub fn new(config: &GateConfig) -> Result<Self> {
        let mut patterns: Vec<Regex> = DENY_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<_, _>>()?;

        if !config.opsec_keywords.is_empty() {
            let keywords = config
                .opsec_keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            patterns.push(Regex::new(&format!(r"(?i)\b({})\b", keywords))?);
        }

        Ok(Self {
            safe_words: config
                .safe_words
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
            patterns,
            capitalized: Regex::new(r"\b[A-Z][a-z]+\b")?,
        })
    }

    /// Whether `text` looks like it contains PII or OPSEC-sensitive content.
    ///
    /// The safe-context allow-list short-circuits every deny pattern: domain
    /// jargon like program acronyms is known to trigger false positives.
    pub fn is_sensitive(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        if self.safe_words.iter().any(|word| lowered.contains(word)) {
            return false;
        }

        if self.patterns.iter().any(|p| p.is_match(text)) {
            return true;
        }

        self.has_probable_name(text)
    }

    /// Naive personal-name detection: two capitalized tokens adjacent in
    /// the text are treated as a probable name.
    fn has_probable_name(&self, text: &str) -> bool {
        let tokens: Vec<&str> = self
            .capitalized
            .find_iter(text)
            .map(|m| m.as_str())
            .collect();
        if tokens.len() < 2 {
            return false;
        }

        for pair in tokens.windows(2) {
            let bigram = format!(
                r"\b{} {}\b",
                regex::escape(pair[0]),
                regex::escape(pair[1])
            );
            if let Ok(re) = Regex::new(&bigram) {
                if re.is_match(text) {
                    return true;
                }
            }
        }

        false
    }
}
