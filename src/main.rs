//! # Lorekeeper CLI (`lore`)
//!
//! The `lore` binary is the primary interface for Lorekeeper. It
//! provides commands for database initialization, document import,
//! search, one-shot and interactive question answering, store
//! diagnostics, and the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! lore --config ./config/lore.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lore init` | Create the SQLite database and run schema migrations |
//! | `lore import <path>` | Import documents from a directory or JSONL file |
//! | `lore search "<query>"` | Search stored documents |
//! | `lore ask "<question>"` | Answer one question and exit |
//! | `lore chat` | Interactive chat loop |
//! | `lore stats` | Store and entity-index diagnostics |
//! | `lore serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use lorekeeper::{chat, config, db, entities, import, migrate, search, server, sqlite_store, stats};
use lorekeeper_core::store::DocumentStore;

/// Lorekeeper — a retrieval-augmented lore chatbot over a wiki
/// knowledge base.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file. See `config/lore.example.toml` for a full
/// example.
#[derive(Parser)]
#[command(
    name = "lore",
    about = "Lorekeeper — a retrieval-augmented lore chatbot over a wiki knowledge base",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lore.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the documents table, and the
    /// FTS5 search index. Idempotent — running it multiple times is
    /// safe.
    Init,

    /// Import documents from a directory or JSONL file.
    ///
    /// A directory is walked for text files shaped
    /// `Title: {title}` followed by a blank line and the content; a
    /// `.jsonl` file is read as one JSON document object per line.
    /// Imports are upserts keyed by title, so re-running never
    /// duplicates documents.
    Import {
        /// Directory of `.txt` files, or a `.jsonl`/`.json` file.
        path: PathBuf,
    },

    /// Search stored documents.
    ///
    /// Prints ranked hits with scores and an excerpt around the query
    /// match. Falls back to title-substring lookup when nothing scores.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Answer one question and exit.
    Ask {
        /// The question to answer.
        question: String,
    },

    /// Interactive chat loop.
    ///
    /// Type `exit`, `quit`, or `bye` to leave.
    Chat,

    /// Print store and entity-index diagnostics.
    Stats,

    /// Start the HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// the chat API endpoints.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { path } => {
            let pool = db::connect(&cfg).await?;
            let store = sqlite_store::SqliteStore::new(pool);
            import::run_import(&cfg, &store, &path).await?;

            // The entity index derives from titles; report the rebuilt
            // counts so imports surface classification changes.
            let index = entities::EntityIndex::build(&store).await?;
            println!(
                "Loaded {} characters, {} houses, and {} locations",
                index.characters.len(),
                index.houses.len(),
                index.locations.len()
            );
            store.pool().close().await;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Ask { question } => {
            chat::run_ask(&cfg, &question).await?;
        }
        Commands::Chat => {
            chat::run_chat(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            let chatbot = chat::Chatbot::from_config(&cfg).await?;
            if chatbot.store().count().await? == 0 {
                println!("WARNING: The document store is empty. Run `lore import <path>` first.");
            }
            server::run_server_with_chatbot(&cfg, Arc::new(chatbot)).await?;
        }
    }

    Ok(())
}
