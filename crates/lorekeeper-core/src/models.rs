//! Core data models used throughout Lorekeeper.
//!
//! These types represent the documents, search hits, and excerpts that
//! flow through the retrieval and answer pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored wiki page, keyed by its unique title.
///
/// Re-importing a document with the same title overwrites the previous
/// one (upsert) — the store never holds two documents with one title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique key, case-sensitive as stored.
    pub title: String,
    /// Full page text.
    pub content: String,
    /// Where the document came from (e.g. `"import"`, `"wiki"`).
    #[serde(default)]
    pub source: Option<String>,
    /// Web-browsable URL, if known.
    #[serde(default)]
    pub url: Option<String>,
    /// When the document was imported or scraped.
    #[serde(default)]
    pub imported_at: Option<DateTime<Utc>>,
    /// Original filename for file-based imports.
    #[serde(default)]
    pub filename: Option<String>,
}

impl Document {
    /// Convenience constructor for title + content only.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            source: None,
            url: None,
            imported_at: None,
            filename: None,
        }
    }
}

/// A document paired with the relevance score the store assigned it.
///
/// Scores are opaque and only comparable within one query: higher means
/// more relevant. Constructed per query, never persisted.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub document: Document,
    pub score: f64,
}

/// A bounded snippet of a document's content around a query match.
///
/// Produced by [`crate::excerpt::extract_excerpt`] and consumed by the
/// context assembler. The truncation flags record whether the excerpt
/// was cut from a larger body of text on either side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    /// Title of the document the text was taken from.
    pub source_title: String,
    /// The excerpt text, trimmed of surrounding whitespace.
    pub text: String,
    /// True when text precedes the excerpt in the source document.
    pub truncated_before: bool,
    /// True when text follows the excerpt in the source document.
    pub truncated_after: bool,
}

impl Excerpt {
    /// Render the excerpt with ellipsis markers where it was truncated.
    pub fn rendered(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + 6);
        if self.truncated_before {
            out.push_str("...");
        }
        out.push_str(&self.text);
        if self.truncated_after {
            out.push_str("...");
        }
        out
    }
}

/// One question/answer exchange in a chat session's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub response: String,
    /// First ~100 characters of the context used, or `"None"` when the
    /// query produced no context.
    pub context_preview: String,
}

impl ConversationTurn {
    /// Build a turn, deriving the context preview from the full context.
    pub fn new(question: impl Into<String>, response: impl Into<String>, context: &str) -> Self {
        let context_preview = if context.is_empty() {
            "None".to_string()
        } else {
            let cut = floor_char_boundary(context, 100);
            format!("{}...", &context[..cut])
        };
        Self {
            question: question.into(),
            response: response.into(),
            context_preview,
        }
    }
}

/// Snap a byte index down to the nearest valid UTF-8 char boundary.
pub(crate) fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_no_truncation() {
        let e = Excerpt {
            source_title: "Jon Snow".to_string(),
            text: "Jon Snow is the son of Lyanna Stark.".to_string(),
            truncated_before: false,
            truncated_after: false,
        };
        assert_eq!(e.rendered(), "Jon Snow is the son of Lyanna Stark.");
    }

    #[test]
    fn test_rendered_both_sides() {
        let e = Excerpt {
            source_title: "Jon Snow".to_string(),
            text: "son of Lyanna".to_string(),
            truncated_before: true,
            truncated_after: true,
        };
        assert_eq!(e.rendered(), "...son of Lyanna...");
    }

    #[test]
    fn test_turn_preview_empty_context() {
        let turn = ConversationTurn::new("who?", "no idea", "");
        assert_eq!(turn.context_preview, "None");
    }

    #[test]
    fn test_turn_preview_truncates() {
        let context = "x".repeat(500);
        let turn = ConversationTurn::new("who?", "answer", &context);
        assert_eq!(turn.context_preview.len(), 103);
        assert!(turn.context_preview.ends_with("..."));
    }

    #[test]
    fn test_floor_char_boundary_multibyte() {
        let s = "héllo";
        // Index 2 falls inside the two-byte 'é'.
        assert_eq!(floor_char_boundary(s, 2), 1);
        assert_eq!(floor_char_boundary(s, 20), s.len());
    }
}
