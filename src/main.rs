//! # CAG CLI (`cag`)
//!
//! The `cag` binary answers questions about a restaurant's menu from an
//! ingested markdown knowledge base.
//!
//! ## Usage
//!
//! ```bash
//! cag --config ./config/cag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cag init` | Ingest the documents folder into the index (no-op if populated) |
//! | `cag ask "<query>"` | Answer a single question |
//! | `cag chat` | Interactive question loop |
//! | `cag serve` | Start the HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! # One-time ingestion
//! cag init --config ./config/cag.toml
//!
//! # One-shot question via the full augmentation pipeline
//! cag ask "Can you recommend a wine pairing for pasta?" --mode pipeline
//!
//! # Start the HTTP API
//! cag serve --config ./config/cag.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cag::{config, engine, ingest, repl, server};

/// CAG — context-augmented generation for restaurant menu Q&A.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/cag.example.toml` for a full example. The OpenAI key
/// is read from the `OPENAI_API_KEY` environment variable.
#[derive(Parser)]
#[command(
    name = "cag",
    about = "Context-augmented generation for restaurant menu Q&A",
    version,
    long_about = "CAG ingests a folder of markdown menu documents into a persistent vector \
    index and answers natural-language questions about them, either via a single model call \
    (fast mode) or a three-stage analyze/augment/generate pipeline."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cag.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest the documents folder into the index store.
    ///
    /// Loads every `.md` file from the configured folder, chunks and embeds
    /// it, and writes the entries to the SQLite store. A no-op when the
    /// store already holds entries; delete the store file to re-ingest a
    /// changed corpus.
    Init,

    /// Answer a single question and print the result.
    Ask {
        /// The question to ask about the menu.
        query: String,

        /// Override the configured answer strategy: `fast` or `pipeline`.
        #[arg(long)]
        mode: Option<String>,
    },

    /// Interactive question loop.
    Chat,

    /// Start the HTTP API server.
    ///
    /// Binds to `[server].bind` and serves `/query`, `/query/async`,
    /// `/jobs/{id}`, and `/health`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            ingest::run_init(&cfg).await?;
        }
        Commands::Ask { query, mode } => {
            if let Some(mode) = mode {
                cfg.generation.mode = mode;
            }
            let engine = engine::bootstrap(&cfg).await?;
            let outcome = engine.process_query(&query).await?;

            println!("{}", outcome.answer);
            if !outcome.initial_context.is_empty() {
                let mut sources: Vec<&str> = Vec::new();
                for ctx in &outcome.initial_context {
                    if !sources.contains(&ctx.source.as_str()) {
                        sources.push(&ctx.source);
                    }
                }
                println!();
                println!("sources: {}", sources.join(", "));
            }
        }
        Commands::Chat => {
            let restaurant = cfg.generation.restaurant.clone();
            let engine = engine::bootstrap(&cfg).await?;
            repl::run_chat(&engine, &restaurant).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
