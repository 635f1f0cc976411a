//! The `lore search` command.
//!
//! Runs a ranked store search and prints each hit with its score and an
//! excerpt around the query match. Falls back to title-substring lookup
//! when relevance search finds nothing, so near-miss queries still
//! surface candidate pages.

use anyhow::Result;

use lorekeeper_core::excerpt::extract_excerpt;
use lorekeeper_core::models::SearchHit;
use lorekeeper_core::store::DocumentStore;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;
use crate::db;

pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let limit = limit.unwrap_or(config.retrieval.search_limit);

    let mut hits = store.search(query, limit).await?;

    if hits.is_empty() {
        // Secondary, lower-precision retrieval mode.
        hits = store
            .find_title_contains(query.trim(), limit)
            .await?
            .into_iter()
            .map(|document| SearchHit {
                document,
                score: 0.0,
            })
            .collect();
    }

    if hits.is_empty() {
        println!("No results.");
        store.pool().close().await;
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let excerpt = extract_excerpt(
            &hit.document,
            query,
            config.retrieval.excerpt_context_chars,
        );
        println!("{}. [{:.2}] {}", i + 1, hit.score, hit.document.title);
        if let Some(ref url) = hit.document.url {
            println!("    url: {url}");
        }
        println!(
            "    excerpt: \"{}\"",
            excerpt.rendered().replace('\n', " ")
        );
        println!();
    }

    store.pool().close().await;
    Ok(())
}
