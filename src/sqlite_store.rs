//! SQLite-backed [`DocumentStore`] implementation.
//!
//! Documents live in a plain table keyed by title, with a parallel FTS5
//! table providing bm25-ranked full-text search over title and content.
//! Both tables are kept in sync inside the upsert transaction.

use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use sqlx::{Row, SqlitePool};

use lorekeeper_core::models::{Document, SearchHit};
use lorekeeper_core::store::DocumentStore;

/// SQLite implementation of the [`DocumentStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Document {
    let imported_at: Option<i64> = row.get("imported_at");
    Document {
        title: row.get("title"),
        content: row.get("content"),
        source: row.get("source"),
        url: row.get("url"),
        imported_at: imported_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        filename: row.get("filename"),
    }
}

/// Build an FTS5 MATCH expression from a free-text query.
///
/// User queries are not FTS5 syntax: quotes each alphanumeric token and
/// joins with OR, so punctuation and operators in the raw query can
/// never produce a syntax error. Returns `None` when the query has no
/// searchable tokens.
fn fts_match_expr(query: &str) -> Option<String> {
    let tokens: Vec<&str> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return None;
    }
    Some(
        tokens
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn upsert(&self, doc: &Document) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let next_seq: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(seq) + 1, 0) FROM documents")
                .fetch_one(&mut *tx)
                .await?;

        // seq is assigned once and survives re-imports, so score ties
        // keep breaking in first-import order.
        sqlx::query(
            r#"
            INSERT INTO documents (title, content, source, url, imported_at, filename, seq)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(title) DO UPDATE SET
                content = excluded.content,
                source = excluded.source,
                url = excluded.url,
                imported_at = excluded.imported_at,
                filename = excluded.filename
            "#,
        )
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(&doc.source)
        .bind(&doc.url)
        .bind(doc.imported_at.map(|dt| dt.timestamp()))
        .bind(&doc.filename)
        .bind(next_seq)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM documents_fts WHERE title = ?")
            .bind(&doc.title)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO documents_fts (title, content) VALUES (?, ?)")
            .bind(&doc.title)
            .bind(&doc.content)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let Some(match_expr) = fts_match_expr(query) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT title, rank
            FROM documents_fts
            WHERE documents_fts MATCH ?
            ORDER BY rank, rowid
            LIMIT ?
            "#,
        )
        .bind(&match_expr)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let title: String = row.get("title");
            let rank: f64 = row.get("rank");
            let doc_row = sqlx::query("SELECT * FROM documents WHERE title = ?")
                .bind(&title)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(doc_row) = doc_row {
                hits.push(SearchHit {
                    document: row_to_document(&doc_row),
                    // FTS5 rank is negative-better; negate so higher = more relevant.
                    score: -rank,
                });
            }
        }

        Ok(hits)
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT * FROM documents WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_document))
    }

    async fn find_title_contains(&self, fragment: &str, limit: usize) -> Result<Vec<Document>> {
        if fragment.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            "SELECT * FROM documents WHERE instr(lower(title), lower(?)) > 0 ORDER BY seq LIMIT ?",
        )
        .bind(fragment)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_document).collect())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn sample(&self, n: usize) -> Result<Vec<Document>> {
        let rows = sqlx::query("SELECT * FROM documents ORDER BY RANDOM() LIMIT ?")
            .bind(n as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_document).collect())
    }

    async fn all_titles(&self) -> Result<Vec<String>> {
        let rows = sqlx::query_scalar("SELECT title FROM documents ORDER BY seq")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::apply_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> SqliteStore {
        // A single connection keeps every query on the same in-memory DB.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        apply_schema(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_title() {
        let store = test_store().await;
        store
            .upsert(&Document::new("Jon Snow", "Bastard of Winterfell."))
            .await
            .unwrap();
        store
            .upsert(&Document::new("Jon Snow", "King in the North."))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let doc = store.find_by_title("Jon Snow").await.unwrap().unwrap();
        assert_eq!(doc.content, "King in the North.");
    }

    #[tokio::test]
    async fn test_search_ranked_and_bounded() {
        let store = test_store().await;
        store
            .upsert(&Document::new(
                "Jon Snow",
                "Jon Snow is the bastard son of Eddard Stark. Jon Snow joined the Night's Watch.",
            ))
            .await
            .unwrap();
        store
            .upsert(&Document::new(
                "Winterfell",
                "Jon Snow visited once.",
            ))
            .await
            .unwrap();
        store
            .upsert(&Document::new("Dorne", "A land of sun and spice."))
            .await
            .unwrap();

        let hits = store.search("Jon Snow", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.title, "Jon Snow");
        assert!(hits[0].score >= hits[1].score);

        let limited = store.search("Jon Snow", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_search_punctuation_query_is_safe() {
        let store = test_store().await;
        store
            .upsert(&Document::new("Jon Snow", "Watcher on the Wall."))
            .await
            .unwrap();

        // Raw FTS5 syntax in the query must not error out.
        let hits = store.search("who is \"Jon\" AND (Snow)?", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(store.search("?!...", 10).await.unwrap().is_empty());
        assert!(store.search("", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_title_contains() {
        let store = test_store().await;
        store
            .upsert(&Document::new("House Stark", "Winter is coming."))
            .await
            .unwrap();
        store
            .upsert(&Document::new("House Tully", "Family, duty, honor."))
            .await
            .unwrap();
        store
            .upsert(&Document::new("Jon Snow", "The Wall."))
            .await
            .unwrap();

        let docs = store.find_title_contains("house", 10).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "House Stark");
        assert!(store.find_title_contains("", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sample_and_titles() {
        let store = test_store().await;
        for title in ["A", "B", "C"] {
            store
                .upsert(&Document::new(title, "content"))
                .await
                .unwrap();
        }
        assert_eq!(store.sample(2).await.unwrap().len(), 2);
        assert_eq!(store.all_titles().await.unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_fts_match_expr() {
        assert_eq!(
            fts_match_expr("Jon Snow").as_deref(),
            Some("\"Jon\" OR \"Snow\"")
        );
        assert_eq!(
            fts_match_expr("who is \"Jon\"?").as_deref(),
            Some("\"who\" OR \"is\" OR \"Jon\"")
        );
        assert_eq!(fts_match_expr("?!.."), None);
        assert_eq!(fts_match_expr(""), None);
    }
}
