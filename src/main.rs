//! # TravelBot CLI
//!
//! The `travelbot` binary covers the offline corpus workflow and the two
//! question interfaces.
//!
//! ## Usage
//!
//! ```bash
//! travelbot --config ./config/travelbot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `travelbot ingest` | Build the chunk store from the source document directory |
//! | `travelbot index --mode all` | Embed the whole store into the primary snapshot |
//! | `travelbot index --mode retrain --flagged <key>...` | Build the retrain snapshot from flagged chunks |
//! | `travelbot ask "<question>"` | Answer a single question |
//! | `travelbot chat` | Interactive question loop |
//! | `travelbot serve` | Start the HTTP question shell |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use travelbot::config;
use travelbot::embedding::HttpEmbedder;
use travelbot::generation::HttpGenerator;
use travelbot::index::{run_build_index, IndexMode};
use travelbot::pipeline::Pipeline;
use travelbot::{chat, ingest, server};

/// TravelBot — retrieval-augmented question answering over military travel
/// regulations.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/travelbot.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "travelbot",
    about = "TravelBot — retrieval-augmented QA over military travel regulations",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/travelbot.toml`. Store paths, chunking
    /// parameters, model endpoints, and server settings are read from
    /// this file.
    #[arg(long, global = true, default_value = "./config/travelbot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Build the chunk store from the source document directory.
    ///
    /// Extracts text from each PDF or plain-text document, splits it into
    /// overlapping chunks, discards chunks below the quality floor, flags
    /// chunks matching the content denylist, and atomically replaces the
    /// chunk store with the survivors. This command is idempotent.
    Ingest,

    /// Embed the chunk store into a named index snapshot.
    ///
    /// Mode `all` embeds the whole store into the primary snapshot; mode
    /// `retrain` embeds only the chunks named by `--flagged` into a
    /// separate snapshot. Either way the snapshot is rebuilt from scratch
    /// and swapped in atomically.
    Index {
        /// Which snapshot to build: `all` or `retrain`.
        #[arg(long, default_value = "all")]
        mode: String,

        /// Chunk keys (e.g. `jtr_chunk4`) to include in a retrain build.
        /// Required (one or more) when `--mode retrain`.
        #[arg(long = "flagged")]
        flagged: Vec<String>,
    },

    /// Answer a single question and exit.
    Ask {
        /// The question text.
        query: String,
    },

    /// Interactive question loop.
    ///
    /// Prints a handling notice, then reads questions from stdin until
    /// `exit`. `help` and `history` are interpreted as commands.
    Chat,

    /// Start the HTTP question shell.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// `POST /ask` and `GET /health`.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest => {
            let report = ingest::run_ingest(&cfg)?;
            println!("ingest");
            println!("  documents processed: {}", report.documents_processed);
            println!("  documents skipped: {}", report.documents_skipped);
            println!("  chunks written: {}", report.chunks_written);
            println!("  chunks flagged: {}", report.chunks_flagged);
            println!("  chunks discarded: {}", report.chunks_discarded);
            println!("ok");
        }
        Commands::Index { mode, flagged } => {
            let mode = match mode.as_str() {
                "all" => IndexMode::All,
                "retrain" => {
                    if flagged.is_empty() {
                        anyhow::bail!("--mode retrain requires at least one --flagged chunk key");
                    }
                    IndexMode::Retrain
                }
                other => anyhow::bail!("Unknown index mode '{}': expected 'all' or 'retrain'", other),
            };
            let embedder = HttpEmbedder::new(&cfg.embedding)?;
            run_build_index(&cfg, mode, &flagged, &embedder).await?;
        }
        Commands::Ask { query } => {
            let pipeline = load_pipeline(&cfg, "cli")?;
            println!("{}", pipeline.answer(&query).await);
        }
        Commands::Chat => {
            let pipeline = Arc::new(load_pipeline(&cfg, "cli")?);
            chat::run_chat(pipeline).await?;
        }
        Commands::Serve => {
            let pipeline = Arc::new(load_pipeline(&cfg, "web")?);
            server::run_server(&cfg, pipeline).await?;
        }
    }

    Ok(())
}

fn load_pipeline(cfg: &config::Config, mode: &str) -> Result<Pipeline> {
    let embedder = Arc::new(HttpEmbedder::new(&cfg.embedding)?);
    let generator = Arc::new(HttpGenerator::new(&cfg.generation)?);
    Pipeline::load(cfg, embedder, generator, mode)
}
