//! Hallucination filtering for generated answers.
//!
//! Compares the entities mentioned in a generated answer against those
//! present in the context it was generated from, and appends a caution
//! disclaimer when the answer names things the context never did.
//!
//! Entity extraction is a heuristic: capitalized single words plus
//! two- and three-word windows over lowercased tokens. It under-flags
//! multi-word names that don't align with the n-gram windows and
//! over-flags generic capitalized words — an accepted precision/recall
//! tradeoff, not a defect.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Minimum candidate length; shorter fragments are too noisy to flag.
const MIN_ENTITY_LEN: usize = 3;

/// Maximum number of suspect entities named in the disclaimer.
const MAX_LISTED: usize = 3;

/// Generic connective words never worth flagging.
const STOPLIST: [&str; 36] = [
    "this", "that", "these", "those", "there", "their", "they", "about", "which", "would",
    "could", "should", "have", "based", "information", "because", "however", "while", "series",
    "character", "season", "episode", "show", "many", "more", "other", "another", "first",
    "second", "last", "next", "previous", "following", "before", "after", "during",
];

/// Domain-common words excluded alongside [`STOPLIST`].
const DOMAIN_STOPLIST: [&str; 4] = ["game", "thrones", "westeros", "essos"];

/// Phrases that signal the answer already hedges about missing
/// information.
const UNCERTAINTY_PHRASES: [&str; 15] = [
    "i don't have information",
    "not mentioned in",
    "isn't specified",
    "not specified",
    "isn't mentioned",
    "not provided",
    "no information",
    "don't know",
    "isn't clear",
    "not clear",
    "based on the information i have",
    "the provided context doesn't",
    "not detailed in",
    "can't determine",
    "cannot determine",
];

fn capitalized_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z][a-z]+\b").expect("valid regex"))
}

/// Extract candidate entities from `text`: capitalized words plus 2- and
/// 3-word windows over lowercased, punctuation-stripped tokens. All
/// candidates are lowercased; only those longer than `MIN_ENTITY_LEN`
/// survive.
pub fn extract_entities(text: &str) -> BTreeSet<String> {
    let mut entities = BTreeSet::new();

    for m in capitalized_word_re().find_iter(text) {
        entities.insert(m.as_str().to_lowercase());
    }

    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|t| !t.is_empty())
        .collect();

    for window in tokens.windows(2) {
        entities.insert(window.join(" "));
    }
    for window in tokens.windows(3) {
        entities.insert(window.join(" "));
    }

    entities.retain(|e| e.len() > MIN_ENTITY_LEN);
    entities
}

/// Entities present in `answer` but absent from `context`, minus the
/// stoplists. Deterministically ordered.
pub fn suspect_entities(answer: &str, context: &str) -> BTreeSet<String> {
    let answer_entities = extract_entities(answer);
    let context_entities = extract_entities(context);

    answer_entities
        .into_iter()
        .filter(|e| !context_entities.contains(e))
        .filter(|e| !STOPLIST.contains(&e.as_str()) && !DOMAIN_STOPLIST.contains(&e.as_str()))
        .collect()
}

/// Post-process a generated `answer` against the `context` it was
/// produced from.
///
/// Returns the answer unchanged when every mentioned entity is
/// traceable to the context, or when the answer already hedges with an
/// uncertainty phrase alongside a suspect term. Otherwise appends a
/// disclaimer naming up to three unsupported entities.
pub fn filter_hallucinations(answer: &str, context: &str) -> String {
    if answer.is_empty() {
        return answer.to_string();
    }

    let suspects = suspect_entities(answer, context);
    if suspects.is_empty() {
        return answer.to_string();
    }

    let answer_lower = answer.to_lowercase();
    let hedged = UNCERTAINTY_PHRASES
        .iter()
        .any(|phrase| answer_lower.contains(phrase))
        && suspects.iter().any(|e| answer_lower.contains(e.as_str()));
    if hedged {
        return answer.to_string();
    }

    format!("{}\n\n{}", answer, disclaimer(&suspects))
}

fn disclaimer(suspects: &BTreeSet<String>) -> String {
    let listed: Vec<String> = suspects
        .iter()
        .take(MAX_LISTED)
        .map(|s| format!("\"{s}\""))
        .collect();
    format!(
        "Note: Some details in this response might extend beyond the information provided in the context. \
         The information about {} is not explicitly mentioned in the provided dataset. \
         Please consider this information with caution.",
        listed.join(", ")
    )
}
