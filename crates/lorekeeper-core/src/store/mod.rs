//! Storage abstraction for Lorekeeper.
//!
//! The [`DocumentStore`] trait defines all storage operations needed by
//! the retrieval pipeline, enabling pluggable backends (SQLite full-text
//! search, in-memory). Implementations must be `Send + Sync` so that
//! concurrent queries can share one store; reads must not block each
//! other.
//!
//! [`VectorSearcher`] is the optional semantic-retrieval seam: when a
//! backend capable of vector similarity is available, the context
//! assembler consults it first and silently falls back to lexical
//! search on any failure.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Document, SearchHit};

/// Abstract document storage backend.
///
/// All operations are async (via `async-trait`) so SQL-backed stores
/// can implement them directly; in-memory implementations return
/// immediately-ready futures.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](DocumentStore::upsert) | Insert or overwrite by title |
/// | [`search`](DocumentStore::search) | Lexical relevance search over title + content |
/// | [`find_by_title`](DocumentStore::find_by_title) | Exact title lookup |
/// | [`find_title_contains`](DocumentStore::find_title_contains) | Case-insensitive title substring lookup |
/// | [`count`](DocumentStore::count) | Total stored documents |
/// | [`sample`](DocumentStore::sample) | Random documents for diagnostics |
/// | [`all_titles`](DocumentStore::all_titles) | Every stored title, insertion order |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or overwrite a document, keyed by title. Last write wins;
    /// re-inserting an existing title is not an error.
    async fn upsert(&self, doc: &Document) -> Result<()>;

    /// Return up to `limit` documents ranked by textual relevance over
    /// title and content. Ties break by insertion order. An empty query
    /// or an empty store yields an empty vec, never an error.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;

    /// Exact-match title lookup.
    async fn find_by_title(&self, title: &str) -> Result<Option<Document>>;

    /// Case-insensitive substring lookup on titles. A lower-precision
    /// secondary retrieval mode for when relevance scoring is
    /// unavailable.
    async fn find_title_contains(&self, fragment: &str, limit: usize) -> Result<Vec<Document>>;

    /// Total number of stored documents.
    async fn count(&self) -> Result<u64>;

    /// Up to `n` documents chosen uniformly at random without
    /// replacement. Used for diagnostics, not retrieval.
    async fn sample(&self, n: usize) -> Result<Vec<Document>>;

    /// Every stored title in insertion order. Feeds the derived entity
    /// index rebuilt after imports.
    async fn all_titles(&self) -> Result<Vec<String>>;
}

/// Optional vector-similarity retrieval backend.
///
/// The context assembler treats this as a best-effort accelerator: a
/// returned error is logged and the lexical path takes over, invisible
/// to the caller.
#[async_trait]
pub trait VectorSearcher: Send + Sync {
    /// Return up to `limit` hits ranked by semantic similarity.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}
