//! Query-time answer pipeline.
//!
//! One pipeline instance serves both the interactive CLI and the web shell.
//! Every query is audited first, then screened by the sensitivity gate, and
//! only then retrieved against and answered. Failures past the gate degrade
//! to a fixed apology rather than surfacing internals to the user.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, warn};

use crate::audit::QuestionLog;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::gate::SensitivityGate;
use crate::generation::Generator;
use crate::index::{IndexMode, VectorIndex};
use crate::retrieve::Retriever;
use crate::synth::Synthesizer;

/// Returned verbatim for queries the sensitivity gate blocks.
pub const SENSITIVE_WARNING: &str =
    "Input may contain sensitive information. Please rephrase your question.";

const APOLOGY: &str =
    "Sorry, I ran into a problem answering that. Please try again in a moment.";

pub struct Pipeline {
    gate: SensitivityGate,
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    synthesizer: Synthesizer,
    question_log: QuestionLog,
    k: usize,
    mode: String,
}

impl Pipeline {
    pub fn new(
        gate: SensitivityGate,
        retriever: Retriever,
        generator: Arc<dyn Generator>,
        synthesizer: Synthesizer,
        question_log: QuestionLog,
        k: usize,
        mode: &str,
    ) -> Self {
        Self {
            gate,
            retriever,
            generator,
            synthesizer,
            question_log,
            k,
            mode: mode.to_string(),
        }
    }

    /// Assemble a pipeline for the configured active snapshot.
    ///
    /// Loading the snapshot happens here, at startup, so a missing or
    /// corrupt index fails the process immediately instead of surfacing as
    /// per-query apologies.
    pub fn load(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        mode: &str,
    ) -> Result<Self> {
        let snapshot = match config.retrieval.active_snapshot.as_str() {
            "retrain" => IndexMode::Retrain.snapshot_name(),
            _ => IndexMode::All.snapshot_name(),
        };
        let index = VectorIndex::load(&config.index.dir, snapshot)
            .with_context(|| format!("Failed to load index snapshot '{}'", snapshot))?;

        Ok(Self::new(
            SensitivityGate::new(&config.gate)?,
            Retriever::new(index, embedder),
            generator,
            Synthesizer::new(config.synthesis.clone()),
            QuestionLog::new(&config.audit.question_log),
            config.retrieval.k,
            mode,
        ))
    }

    /// Answer a user query. Always returns displayable text.
    pub async fn answer(&self, query: &str) -> String {
        if let Err(e) = self.question_log.record(query, &self.mode) {
            warn!("Failed to record question: {:#}", e);
        }

        if self.gate.is_sensitive(query) {
            return SENSITIVE_WARNING.to_string();
        }

        match self.try_answer(query).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Failed to answer query: {:#}", e);
                APOLOGY.to_string()
            }
        }
    }

    async fn try_answer(&self, query: &str) -> Result<String> {
        let retrieved = self.retriever.retrieve(query, self.k).await?;

        let prompt = format!(
            "You are a military travel assistant. In one or two sentences, \
             introduce an answer to this question about travel entitlements: {}",
            query.trim()
        );
        let preface = self.generator.generate(&prompt).await?;

        Ok(self.synthesizer.synthesize(&preface, &retrieved))
    }
}
