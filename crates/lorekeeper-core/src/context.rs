//! Context assembly — search, excerpt, and pack under a budget.
//!
//! The assembler runs a search, extracts an excerpt per hit, and packs
//! the excerpts into one context string bounded by `max_chars`. Hits are
//! consumed in rank order; the first block that would overflow the
//! budget stops assembly entirely, since lower-ranked hits are less
//! valuable than the one just dropped.
//!
//! When a [`VectorSearcher`] is supplied it is consulted first, and any
//! failure of the vector path silently degrades to lexical search — the
//! caller never observes the difference.

use tracing::warn;

use crate::excerpt::{extract_excerpt, DEFAULT_CONTEXT_CHARS};
use crate::models::SearchHit;
use crate::store::{DocumentStore, VectorSearcher};

/// Separator between context blocks.
const BLOCK_JOINER: &str = "\n\n";

/// Tuning knobs for context assembly.
#[derive(Debug, Clone)]
pub struct ContextParams {
    /// Maximum number of documents to draw excerpts from.
    pub max_documents: usize,
    /// Hard cap on the assembled context length, in bytes.
    pub max_chars: usize,
    /// Context radius passed to the excerpt extractor.
    pub context_chars: usize,
}

impl Default for ContextParams {
    fn default() -> Self {
        Self {
            max_documents: 5,
            max_chars: 4000,
            context_chars: DEFAULT_CONTEXT_CHARS,
        }
    }
}

/// Assemble a budget-capped context string for `query`.
///
/// Returns the empty string when the query is blank, nothing matches,
/// or the first block alone exceeds the budget — all accepted outcomes,
/// never errors. Backend failures are logged and resolve to the empty
/// context.
pub async fn assemble(
    store: &dyn DocumentStore,
    vector: Option<&dyn VectorSearcher>,
    query: &str,
    params: &ContextParams,
) -> String {
    if query.trim().is_empty() {
        return String::new();
    }

    let hits = search_hits(store, vector, query, params.max_documents).await;

    let mut parts: Vec<String> = Vec::new();
    let mut total = 0usize;

    for hit in &hits {
        let excerpt = extract_excerpt(&hit.document, query, params.context_chars);
        let block = format!("--- {} ---\n{}", excerpt.source_title, excerpt.rendered());
        let cost = block.len() + if parts.is_empty() { 0 } else { BLOCK_JOINER.len() };
        if total + cost > params.max_chars {
            break;
        }
        total += cost;
        parts.push(block);
    }

    parts.join(BLOCK_JOINER)
}

/// Fetch ranked hits, preferring the vector path when present.
async fn search_hits(
    store: &dyn DocumentStore,
    vector: Option<&dyn VectorSearcher>,
    query: &str,
    limit: usize,
) -> Vec<SearchHit> {
    if let Some(v) = vector {
        match v.search(query, limit).await {
            Ok(hits) => return hits,
            Err(err) => {
                warn!(error = %err, "vector search failed, falling back to lexical");
            }
        }
    }

    match store.search(query, limit).await {
        Ok(hits) => hits,
        Err(err) => {
            warn!(error = %err, "lexical search failed, returning empty context");
            Vec::new()
        }
    }
}
