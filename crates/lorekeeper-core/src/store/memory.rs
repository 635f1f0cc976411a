//! In-memory [`DocumentStore`] implementation.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety, so
//! concurrent readers never block each other. Relevance scoring counts
//! query-term occurrences in title and content, with title matches
//! weighted higher — a deliberately simple stand-in for a full-text
//! index, adequate for tests and small corpora.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use rand::seq::SliceRandom;

use crate::models::{Document, SearchHit};

use super::{DocumentStore, VectorSearcher};

/// Occurrence weight applied to title matches relative to content matches.
const TITLE_WEIGHT: f64 = 2.0;

struct StoredDoc {
    doc: Document,
    /// Insertion sequence number, preserved across re-imports so that
    /// score ties break stably.
    seq: u64,
}

struct Inner {
    docs: HashMap<String, StoredDoc>,
    next_seq: u64,
}

/// In-memory store for tests and small corpora.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                docs: HashMap::new(),
                next_seq: 0,
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Count non-overlapping occurrences of `term` in lowercased `text`.
fn occurrences(text_lower: &str, term: &str) -> usize {
    text_lower.matches(term).count()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert(&self, doc: &Document) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let seq = match inner.docs.get(&doc.title) {
            Some(existing) => existing.seq,
            None => {
                let s = inner.next_seq;
                inner.next_seq += 1;
                s
            }
        };
        inner.docs.insert(
            doc.title.clone(),
            StoredDoc {
                doc: doc.clone(),
                seq,
            },
        );
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let inner = self.inner.read().unwrap();
        let mut scored: Vec<(f64, u64, &StoredDoc)> = inner
            .docs
            .values()
            .filter_map(|stored| {
                let title_lower = stored.doc.title.to_lowercase();
                let content_lower = stored.doc.content.to_lowercase();
                let mut score = 0.0;
                for term in &terms {
                    score += occurrences(&content_lower, term) as f64;
                    score += TITLE_WEIGHT * occurrences(&title_lower, term) as f64;
                }
                (score > 0.0).then_some((score, stored.seq, stored))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(score, _, stored)| SearchHit {
                document: stored.doc.clone(),
                score,
            })
            .collect())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Document>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.docs.get(title).map(|s| s.doc.clone()))
    }

    async fn find_title_contains(&self, fragment: &str, limit: usize) -> Result<Vec<Document>> {
        if fragment.is_empty() {
            return Ok(Vec::new());
        }
        let fragment_lower = fragment.to_lowercase();
        let inner = self.inner.read().unwrap();
        let mut matches: Vec<(&StoredDoc, u64)> = inner
            .docs
            .values()
            .filter(|s| s.doc.title.to_lowercase().contains(&fragment_lower))
            .map(|s| (s, s.seq))
            .collect();
        matches.sort_by_key(|(_, seq)| *seq);
        matches.truncate(limit);
        Ok(matches.into_iter().map(|(s, _)| s.doc.clone()).collect())
    }

    async fn count(&self) -> Result<u64> {
        let inner = self.inner.read().unwrap();
        Ok(inner.docs.len() as u64)
    }

    async fn sample(&self, n: usize) -> Result<Vec<Document>> {
        let inner = self.inner.read().unwrap();
        let all: Vec<&StoredDoc> = inner.docs.values().collect();
        let mut rng = rand::thread_rng();
        Ok(all
            .choose_multiple(&mut rng, n.min(all.len()))
            .map(|s| s.doc.clone())
            .collect())
    }

    async fn all_titles(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap();
        let mut titles: Vec<(&str, u64)> = inner
            .docs
            .values()
            .map(|s| (s.doc.title.as_str(), s.seq))
            .collect();
        titles.sort_by_key(|(_, seq)| *seq);
        Ok(titles.into_iter().map(|(t, _)| t.to_string()).collect())
    }
}

/// Brute-force vector search over pre-supplied document embeddings.
///
/// Exists so the assembler's vector-first path can be exercised without
/// a real embedding backend; production deployments plug in their own
/// [`VectorSearcher`].
pub struct StaticVectorSearcher {
    entries: Vec<(Document, Vec<f32>)>,
    embed: fn(&str) -> Vec<f32>,
}

impl StaticVectorSearcher {
    pub fn new(entries: Vec<(Document, Vec<f32>)>, embed: fn(&str) -> Vec<f32>) -> Self {
        Self { entries, embed }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

#[async_trait]
impl VectorSearcher for StaticVectorSearcher {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let query_vec = (self.embed)(query);
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|(doc, vec)| SearchHit {
                document: doc.clone(),
                score: cosine_similarity(&query_vec, vec) as f64,
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with(docs: &[(&str, &str)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (title, content) in docs {
            store.upsert(&Document::new(*title, *content)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_upsert_idempotent() {
        let store = store_with(&[("Jon Snow", "Bastard of Winterfell.")]).await;
        store
            .upsert(&Document::new("Jon Snow", "King in the North."))
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        let doc = store.find_by_title("Jon Snow").await.unwrap().unwrap();
        assert_eq!(doc.content, "King in the North.");
    }

    #[tokio::test]
    async fn test_search_ranks_title_matches_higher() {
        let store = store_with(&[
            ("Winterfell", "The ancient seat of House Stark."),
            ("Jon Snow", "Jon served at Winterfell before the Wall."),
        ])
        .await;
        let hits = store.search("Winterfell", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.title, "Winterfell");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let store = store_with(&[("Jon Snow", "Bastard of Winterfell.")]).await;
        assert!(store.search("", 10).await.unwrap().is_empty());
        assert!(store.search("   ", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_empty_store() {
        let store = MemoryStore::new();
        assert!(store.search("dragons", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tie_break_is_insertion_order() {
        let store = store_with(&[
            ("Astapor", "A city of slavers."),
            ("Yunkai", "A city of slavers."),
        ])
        .await;
        let hits = store.search("slavers", 10).await.unwrap();
        assert_eq!(hits[0].document.title, "Astapor");
        assert_eq!(hits[1].document.title, "Yunkai");
    }

    #[tokio::test]
    async fn test_find_title_contains_case_insensitive() {
        let store = store_with(&[
            ("House Stark", "Winter is coming."),
            ("House Lannister", "Hear me roar."),
            ("Jon Snow", "The Wall."),
        ])
        .await;
        let docs = store.find_title_contains("house", 10).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "House Stark");
    }

    #[tokio::test]
    async fn test_sample_without_replacement() {
        let store = store_with(&[("A", "a"), ("B", "b"), ("C", "c")]).await;
        let sampled = store.sample(2).await.unwrap();
        assert_eq!(sampled.len(), 2);
        assert_ne!(sampled[0].title, sampled[1].title);
        // Asking for more than stored caps at the store size.
        assert_eq!(store.sample(10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_all_titles_insertion_order() {
        let store = store_with(&[("B", "b"), ("A", "a"), ("C", "c")]).await;
        assert_eq!(store.all_titles().await.unwrap(), vec!["B", "A", "C"]);
    }

    fn toy_embed(text: &str) -> Vec<f32> {
        // Two axes: mentions of "wolf" and of "dragon".
        let lower = text.to_lowercase();
        vec![
            lower.matches("wolf").count() as f32,
            lower.matches("dragon").count() as f32,
        ]
    }

    #[tokio::test]
    async fn test_static_vector_searcher_ranks_by_similarity() {
        let entries = vec![
            (
                Document::new("Ghost", "A white wolf."),
                toy_embed("A white wolf."),
            ),
            (
                Document::new("Drogon", "A black dragon."),
                toy_embed("A black dragon."),
            ),
        ];
        let searcher = StaticVectorSearcher::new(entries, toy_embed);

        let hits = searcher.search("the dragon flew", 10).await.unwrap();
        assert_eq!(hits[0].document.title, "Drogon");
        assert!(hits[0].score > hits[1].score);

        let hits = searcher.search("a wolf howled", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.title, "Ghost");
    }
}
