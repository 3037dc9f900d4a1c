//! # TravelBot
//!
//! A retrieval-augmented question answering system for military travel
//! regulations (JTR, DAFI travel guidance, local supplements).
//!
//! TravelBot ingests source regulation documents into a file-backed chunk
//! store, embeds the chunks into named vector index snapshots, and answers
//! questions by retrieving the nearest regulation text, generating a short
//! preface with a language model, and citing the source documents. Queries
//! are screened for PII and OPSEC-sensitive content before any retrieval
//! happens, and every question is recorded in an append-only audit log.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌─────────────┐
//! │ Source     │──▶│  Ingest     │──▶│ Chunk Store │
//! │ PDFs / txt │   │ split+flag │   │ (files)     │
//! └────────────┘   └────────────┘   └──────┬──────┘
//!                                          │ embed
//!                                          ▼
//!                                   ┌─────────────┐
//!                                   │ Index       │
//!                                   │ snapshots   │
//!                                   └──────┬──────┘
//!                      gate ▶ retrieve ▶ synthesize
//!                      ┌──────────┐  ┌──────────┐
//!                      │   CLI    │  │   HTTP   │
//!                      │ ask/chat │  │  /ask    │
//!                      └──────────┘  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! travelbot ingest                  # build the chunk store from source docs
//! travelbot index --mode all       # embed and build the primary snapshot
//! travelbot ask "What is per diem?"
//! travelbot chat                    # interactive question loop
//! travelbot serve                   # start the HTTP question shell
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF and plain-text extraction |
//! | [`chunker`] | Overlapping text splitting |
//! | [`store`] | File-backed chunk store |
//! | [`ingest`] | Corpus ingestion |
//! | [`embedding`] | Embedding service client |
//! | [`generation`] | Generative model client |
//! | [`index`] | Vector index snapshots |
//! | [`gate`] | PII/OPSEC sensitivity screening |
//! | [`retrieve`] | Query-time retrieval |
//! | [`synth`] | Answer synthesis |
//! | [`audit`] | Question audit log |
//! | [`pipeline`] | End-to-end answer pipeline |
//! | [`server`] | HTTP question shell |

pub mod audit;
pub mod chat;
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod gate;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod retrieve;
pub mod server;
pub mod store;
pub mod synth;
