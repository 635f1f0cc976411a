//! Document import pipeline.
//!
//! Feeds the store from the two formats the scraper produces: a
//! directory of plain-text files shaped `Title: {title}\n\n{content}`,
//! or a JSONL file with one `{"title", "content", ...}` object per
//! line. Imports are upserts keyed by title, so re-running an import
//! never duplicates documents.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use lorekeeper_core::models::Document;
use lorekeeper_core::store::DocumentStore;

use crate::config::Config;

/// Header prefix that titles a plain-text document file.
const TITLE_PREFIX: &str = "Title: ";

/// Counters reported after an import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub scanned: usize,
    pub imported: usize,
    pub skipped: usize,
}

/// Import documents from `path` — a `.jsonl`/`.json` file or a
/// directory of `.txt` files — and print a summary.
pub async fn run_import(config: &Config, store: &dyn DocumentStore, path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("Import path does not exist: {}", path.display());
    }

    let report = if path.is_file() {
        import_jsonl(store, path).await?
    } else {
        import_directory(config, store, path).await?
    };

    println!("import {}", path.display());
    println!("  files scanned: {}", report.scanned);
    println!("  documents upserted: {}", report.imported);
    if report.skipped > 0 {
        println!("  skipped: {}", report.skipped);
    }
    println!("ok");

    Ok(())
}

/// Import a JSONL file: one JSON document object per line.
pub async fn import_jsonl(store: &dyn DocumentStore, path: &Path) -> Result<ImportReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut report = ImportReport::default();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        report.scanned += 1;
        match serde_json::from_str::<Document>(line) {
            Ok(mut doc) => {
                if doc.imported_at.is_none() {
                    doc.imported_at = Some(Utc::now());
                }
                store.upsert(&doc).await?;
                report.imported += 1;
            }
            Err(err) => {
                warn!(error = %err, "skipping malformed JSONL line");
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}

/// Import every matching text file under `root`.
pub async fn import_directory(
    config: &Config,
    store: &dyn DocumentStore,
    root: &Path,
) -> Result<ImportReport> {
    let include_set = build_globset(&config.import.include_globs)?;
    let exclude_set = build_globset(&config.import.exclude_globs)?;

    let mut report = ImportReport::default();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        report.scanned += 1;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        match parse_titled_file(&text) {
            Some((title, content)) => {
                let doc = Document {
                    title: title.to_string(),
                    content: content.to_string(),
                    source: Some("import".to_string()),
                    url: None,
                    imported_at: Some(Utc::now()),
                    filename: path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string()),
                };
                store.upsert(&doc).await?;
                report.imported += 1;
            }
            None => {
                debug!(file = %path.display(), "no title header, skipping");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Split a `Title: {title}\n\n{content}` file into its parts.
fn parse_titled_file(text: &str) -> Option<(&str, &str)> {
    let (header, content) = text.split_once("\n\n")?;
    let title = header.strip_prefix(TITLE_PREFIX)?.trim();
    if title.is_empty() || content.is_empty() {
        return None;
    }
    Some((title, content))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DbConfig, ServerConfig};
    use lorekeeper_core::store::memory::MemoryStore;

    fn test_config() -> Config {
        Config {
            db: DbConfig {
                path: "unused.sqlite".into(),
            },
            retrieval: Default::default(),
            generator: Default::default(),
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
            },
            import: Default::default(),
        }
    }

    #[test]
    fn test_parse_titled_file() {
        let parsed = parse_titled_file("Title: Jon Snow\n\nThe bastard of Winterfell.");
        assert_eq!(parsed, Some(("Jon Snow", "The bastard of Winterfell.")));

        assert_eq!(parse_titled_file("No header here"), None);
        assert_eq!(parse_titled_file("Title: Orphan\nno blank line"), None);
        assert_eq!(parse_titled_file("Title: \n\ncontent"), None);
    }

    #[tokio::test]
    async fn test_import_directory_upserts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("jon_snow.txt"),
            "Title: Jon Snow\n\nThe bastard of Winterfell.",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("winterfell.txt"),
            "Title: Winterfell\n\nSeat of House Stark.",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.md"), "not imported").unwrap();
        std::fs::write(dir.path().join("headerless.txt"), "no title header").unwrap();

        let store = MemoryStore::new();
        let report = import_directory(&test_config(), &store, dir.path())
            .await
            .unwrap();

        assert_eq!(report.scanned, 3);
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(store.count().await.unwrap(), 2);

        let doc = store.find_by_title("Jon Snow").await.unwrap().unwrap();
        assert_eq!(doc.content, "The bastard of Winterfell.");
        assert_eq!(doc.filename.as_deref(), Some("jon_snow.txt"));
        assert_eq!(doc.source.as_deref(), Some("import"));
    }

    #[tokio::test]
    async fn test_import_directory_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("jon_snow.txt"),
            "Title: Jon Snow\n\nThe bastard of Winterfell.",
        )
        .unwrap();

        let store = MemoryStore::new();
        import_directory(&test_config(), &store, dir.path())
            .await
            .unwrap();
        import_directory(&test_config(), &store, dir.path())
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_import_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pages.jsonl");
        std::fs::write(
            &file,
            concat!(
                "{\"title\": \"Jon Snow\", \"content\": \"The bastard of Winterfell.\"}\n",
                "{\"title\": \"Dorne\", \"content\": \"A land of sun.\", \"url\": \"https://wiki/Dorne\"}\n",
                "not json at all\n",
            ),
        )
        .unwrap();

        let store = MemoryStore::new();
        let report = import_jsonl(&store, &file).await.unwrap();

        assert_eq!(report.scanned, 3);
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 1);
        let dorne = store.find_by_title("Dorne").await.unwrap().unwrap();
        assert_eq!(dorne.url.as_deref(), Some("https://wiki/Dorne"));
        assert!(dorne.imported_at.is_some());
    }
}
