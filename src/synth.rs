//! Response Synthesizer: fuses the model-generated preface with retrieved
//! regulation text and a deduplicated source citation list.

use std::collections::BTreeSet;

use crate::config::SynthesisConfig;
use crate::models::RetrievedChunk;

const SECTION_SEPARATOR: &str = "\n\n---\n\n";
const FALLBACK_DISCLAIMER: &str = "I couldn't find a specific regulation covering this \
question. Please verify with your local finance office or consult the JTR directly.";

pub struct Synthesizer {
    config: SynthesisConfig,
}

impl Synthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    /// Build the final answer text.
    ///
    /// When nothing was retrieved, or the concatenated context falls below
    /// the substance threshold, the answer is the preface plus a standard
    /// disclaimer instead of thin excerpts presented as authoritative.
    pub fn synthesize(&self, preface: &str, retrieved: &[RetrievedChunk]) -> String {
        let context = retrieved
            .iter()
            .map(|r| r.chunk.content.trim())
            .collect::<Vec<_>>()
            .join("\n\n");

        let sources = self.render_source_list(retrieved);

        if retrieved.is_empty() || context.len() < self.config.min_context_chars {
            return format!(
                "{}{}{}\n\n{}",
                preface.trim(),
                SECTION_SEPARATOR,
                FALLBACK_DISCLAIMER,
                sources
            );
        }

        format!(
            "{}{}{}{}{}",
            preface.trim(),
            SECTION_SEPARATOR,
            context,
            SECTION_SEPARATOR,
            sources
        )
    }

    /// One bulleted line per distinct label, alphabetically sorted.
    fn render_source_list(&self, retrieved: &[RetrievedChunk]) -> String {
        let labels: BTreeSet<String> = retrieved
            .iter()
            .map(|r| self.label_for(&r.chunk.origin))
            .collect();

        let mut out = String::from("Sources:");
        for label in labels {
            out.push_str("\n- ");
            out.push_str(&label);
        }
        out
    }

    /// Configured display name for an origin document, falling back to the
    /// origin itself (the source key with its chunk suffix stripped).
    fn label_for(&self, origin: &str) -> String {
        self.config
            .source_labels
            .get(origin)
            .cloned()
            .unwrap_or_else(|| origin.to_string())
    }
}
