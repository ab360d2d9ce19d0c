//! # sitesage CLI
//!
//! The `sitesage` binary answers natural-language questions about one
//! website. It fetches the site once, builds an in-memory vector index over
//! the text, and serves grounded answers from a chat model.
//!
//! ## Usage
//!
//! ```bash
//! sitesage --config ./config/sitesage.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sitesage corpus` | Fetch the corpus and print chunk statistics |
//! | `sitesage ask "<query>"` | Answer a single question and exit |
//! | `sitesage serve` | Build the knowledge base and start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use sitesage::answer;
use sitesage::chunk::chunk_text;
use sitesage::config;
use sitesage::corpus;
use sitesage::kb::KnowledgeBase;
use sitesage::server;
use sitesage::triage::{self, TriageCategory};

/// sitesage — retrieval-augmented question answering for one website.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/sitesage.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "sitesage",
    about = "sitesage — retrieval-augmented question answering for one website",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/sitesage.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Fetch the corpus and print document and chunk statistics.
    ///
    /// Runs acquisition and chunking only — no embedding provider is
    /// contacted. Useful for verifying the corpus source and chunking
    /// parameters before paying for embeddings.
    Corpus,

    /// Answer a single question and exit.
    ///
    /// Triaged queries are answered locally; everything else builds the
    /// knowledge base, retrieves context, and asks the chat provider.
    Ask {
        /// The question to answer.
        query: String,
    },

    /// Build the knowledge base and start the HTTP server.
    ///
    /// The server binds to `[server].bind` and exposes `POST /ask` and
    /// `GET /health`. Startup fails (and nothing is served) if the corpus
    /// is empty or the embedding provider is unreachable.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Corpus => {
            let raw = corpus::load_corpus(&cfg.corpus).await?;
            let chunks = chunk_text(&raw, cfg.chunking.chunk_size, cfg.chunking.overlap)?;
            println!("corpus");
            println!("  characters: {}", raw.chars().count());
            println!("  chunks: {}", chunks.len());
            println!(
                "  chunk_size: {} / overlap: {}",
                cfg.chunking.chunk_size, cfg.chunking.overlap
            );
            if let Some(first) = chunks.first() {
                let preview: String = first.text.chars().take(120).collect();
                println!("  first chunk: \"{}\"", preview.replace('\n', " "));
            }
        }
        Commands::Ask { query } => {
            // Triage before building anything — fast-path queries never
            // need the index.
            let category = triage::classify(&query);
            if category != TriageCategory::None {
                if let Some(reply) = triage::canned_response(category) {
                    println!("{}", reply);
                    return Ok(());
                }
            }

            println!("Preparing knowledge base...");
            let kb = KnowledgeBase::bootstrap(&cfg).await?;
            println!("Knowledge base ready: {} chunks", kb.chunk_count());

            let completer = answer::create_completer(&cfg.chat)?;
            let context = kb.retrieve(&query, cfg.retrieval.top_k).await?;
            let reply = answer::answer(completer.as_ref(), &query, &context).await?;
            println!("{}", reply);
        }
        Commands::Serve => {
            println!("Preparing knowledge base...");
            let kb = KnowledgeBase::bootstrap(&cfg).await?;
            println!("Knowledge base ready: {} chunks", kb.chunk_count());

            let completer = answer::create_completer(&cfg.chat)?;
            server::run_server(&cfg, Arc::new(kb), completer).await?;
        }
    }

    Ok(())
}
