//! # HealthMate CLI (`hmate`)
//!
//! The `hmate` binary is the primary interface for HealthMate. It provides
//! commands for store initialization, PDF ingestion, question answering,
//! embedding management, and starting the chat server.
//!
//! ## Usage
//!
//! ```bash
//! hmate --config ./config/healthmate.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hmate init` | Create the SQLite store and run schema migrations |
//! | `hmate ingest` | Scan the documents directory and index PDFs |
//! | `hmate ask "<question>"` | Answer a single question from the indexed corpus |
//! | `hmate chat` | Interactive terminal chat |
//! | `hmate serve` | Start the HTTP chat server |
//! | `hmate embed pending` | Backfill missing or stale embeddings |
//! | `hmate embed rebuild` | Delete and regenerate all embeddings |
//! | `hmate stats` | Show corpus and embedding coverage stats |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the store
//! hmate init --config ./config/healthmate.toml
//!
//! # Index the PDF corpus
//! hmate ingest --config ./config/healthmate.toml
//!
//! # One-shot question
//! hmate ask "What are common causes of headaches?"
//!
//! # Start the web chat
//! hmate serve --config ./config/healthmate.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use healthmate::{config, embed_cmd, ingest, migrate, query, repl, server, stats};

/// HealthMate CLI — a retrieval-grounded medical Q&A assistant over a
/// local PDF corpus.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/healthmate.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "hmate",
    about = "HealthMate — a retrieval-grounded medical Q&A assistant over local PDFs",
    version,
    long_about = "HealthMate ingests a directory of medical PDFs, chunks and embeds them into \
    a local SQLite store, and answers health questions grounded in the retrieved passages via \
    an Ollama-hosted model. Front ends: one-shot CLI, interactive terminal chat, and an HTTP \
    chat server."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/healthmate.toml`. All store, document,
    /// embedding, model, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/healthmate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the store schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (documents, chunks, embeddings, chunk_vectors). This command is
    /// idempotent — running it multiple times is safe.
    Init,

    /// Scan the documents directory and index PDFs.
    ///
    /// Extracts text from each PDF, chunks it, embeds the chunks, and
    /// stores everything in SQLite. Unchanged files are skipped by
    /// content hash; unreadable files are skipped with a warning.
    Ingest {
        /// Dry run — show file and chunk counts without writing to the store.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of PDF files to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Answer a single question from the indexed corpus.
    ///
    /// Runs the full retrieval pipeline (query expansion, semantic
    /// retrieval, grounded generation) and prints the answer.
    Ask {
        /// The health question to answer.
        question: String,
    },

    /// Interactive terminal chat.
    ///
    /// Reads one question per line; `exit` or `quit` ends the session.
    Chat,

    /// Start the HTTP chat server.
    ///
    /// Serves the web chat page and JSON API on `[server].bind`.
    Serve,

    /// Manage embedding vectors.
    ///
    /// Subcommands for backfilling and rebuilding embeddings. Requires
    /// an embedding provider (Ollama or OpenAI) to be reachable.
    Embed {
        #[command(subcommand)]
        action: EmbedAction,
    },

    /// Show corpus and embedding coverage stats.
    Stats,
}

/// Embedding management subcommands.
#[derive(Subcommand)]
enum EmbedAction {
    /// Embed chunks that are missing or have stale embeddings.
    ///
    /// Finds chunks without embeddings (or with changed text) and generates
    /// new embedding vectors using the configured provider.
    Pending {
        /// Maximum number of chunks to embed in this run.
        #[arg(long)]
        limit: Option<usize>,

        /// Override the batch size from config (number of texts per API call).
        #[arg(long)]
        batch_size: Option<usize>,

        /// Show counts without performing any embedding.
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete and regenerate all embeddings.
    ///
    /// Useful when switching embedding models or dimensions. Clears all
    /// existing vectors and re-embeds every chunk.
    Rebuild {
        /// Override the batch size from config (number of texts per API call).
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Store initialized successfully.");
        }
        Commands::Ingest { dry_run, limit } => {
            ingest::run_ingest(&cfg, dry_run, limit).await?;
        }
        Commands::Ask { question } => {
            let ctx = query::QueryContext::connect(cfg).await?;
            let answer = ctx.ask(&question).await?;
            println!("{}", answer);
            ctx.close().await;
        }
        Commands::Chat => {
            repl::run_chat(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Embed { action } => match action {
            EmbedAction::Pending {
                limit,
                batch_size,
                dry_run,
            } => {
                embed_cmd::run_embed_pending(&cfg, limit, batch_size, dry_run).await?;
            }
            EmbedAction::Rebuild { batch_size } => {
                embed_cmd::run_embed_rebuild(&cfg, batch_size).await?;
            }
        },
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
