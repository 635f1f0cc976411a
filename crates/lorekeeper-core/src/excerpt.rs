//! Paragraph-aligned excerpt extraction.
//!
//! Given a document and the raw query string, returns a bounded snippet
//! around the first case-insensitive match, widened to blank-line
//! paragraph boundaries where one falls inside the look-around window.
//! When the query does not occur in the content, the excerpt falls back
//! to a prefix of the document.
//!
//! # Algorithm
//!
//! 1. Locate the first case-insensitive occurrence of the query.
//!    Not found → return the first `FALLBACK_PREFIX_CHARS` of content.
//! 2. Found at `pos` → `start = pos - context_chars`,
//!    `end = pos + query.len() + context_chars`.
//! 3. Widen: if a `\n\n` boundary sits within `PARAGRAPH_WINDOW` bytes
//!    before the match, move `start` just past it; symmetrically move
//!    `end` to a boundary within the window after the match.
//! 4. Trim whitespace; flag truncation on each side for ellipsis
//!    rendering.
//!
//! All index arithmetic snaps to UTF-8 char boundaries, so multibyte
//! content never panics.

use crate::models::{floor_char_boundary, Document, Excerpt};

/// Default context radius around a match, in bytes.
pub const DEFAULT_CONTEXT_CHARS: usize = 150;

/// Length of the content prefix returned when the query is not found.
const FALLBACK_PREFIX_CHARS: usize = 300;

/// How far from the match a paragraph boundary may be and still win the
/// widening step.
const PARAGRAPH_WINDOW: usize = 500;

/// Extract a bounded, paragraph-aligned excerpt of `doc` around the
/// first match of `query`.
///
/// The returned excerpt is non-empty whenever the content is non-empty,
/// and for content shorter than `2 * context_chars` containing the
/// query it is the whole trimmed content with no truncation flags.
pub fn extract_excerpt(doc: &Document, query: &str, context_chars: usize) -> Excerpt {
    let content = doc.content.as_str();
    let len = content.len();

    let Some(pos) = find_ignore_ascii_case(content, query.trim()) else {
        let end = floor_char_boundary(content, FALLBACK_PREFIX_CHARS);
        return Excerpt {
            source_title: doc.title.clone(),
            text: content[..end].trim().to_string(),
            truncated_before: false,
            truncated_after: end < len,
        };
    };

    let mut start = floor_char_boundary(content, pos.saturating_sub(context_chars));
    let mut end = floor_char_boundary(content, (pos + query.trim().len() + context_chars).min(len));

    // Prefer a clean paragraph start when one is near enough.
    if let Some(para_start) = content[..pos].rfind("\n\n") {
        if para_start > 0 && pos - para_start <= PARAGRAPH_WINDOW {
            start = para_start + 2;
        }
    }

    if let Some(off) = content[pos..].find("\n\n") {
        let para_end = pos + off;
        if para_end > 0 && para_end - pos < PARAGRAPH_WINDOW {
            end = para_end;
        }
    }

    Excerpt {
        source_title: doc.title.clone(),
        text: content[start..end].trim().to_string(),
        truncated_before: start > 0,
        truncated_after: end < len,
    }
}

/// Find the first occurrence of `needle` in `haystack`, ignoring ASCII
/// case. Returns the byte offset in `haystack`, or `None` for an empty
/// needle.
pub(crate) fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .filter(|&i| haystack.is_char_boundary(i))
        .find(|&i| {
            haystack[i..]
                .get(..needle.len())
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(needle))
        })
}
