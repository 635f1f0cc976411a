//! Rule-based answer formatting.
//!
//! When no remote generator is configured (or one fails), answers are
//! derived from the assembled context by a fixed set of rules: the query
//! is classified by its interrogative, and the matching template pulls a
//! paragraph or sentence out of the context. Deliberately simplistic and
//! fully deterministic apart from the no-information responses, whose
//! selection function is injectable so tests can pin a choice.

use rand::Rng;

/// Query classification, evaluated in declaration order — the first
/// matching interrogative wins, so "who ... why ..." routes to `About`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    About,
    Location,
    Time,
    Reason,
    Process,
    General,
}

/// Classify a query by case-insensitive substring matching on the raw
/// text (not tokenized).
pub fn classify(query: &str) -> QueryKind {
    let q = query.to_lowercase();
    if q.contains("who") || q.contains("what is") {
        QueryKind::About
    } else if q.contains("where") {
        QueryKind::Location
    } else if q.contains("when") {
        QueryKind::Time
    } else if q.contains("why") {
        QueryKind::Reason
    } else if q.contains("how") {
        QueryKind::Process
    } else {
        QueryKind::General
    }
}

/// Locations recognized by the location-response branch.
pub const KNOWN_LOCATIONS: [&str; 21] = [
    "Winterfell",
    "King's Landing",
    "The Wall",
    "Casterly Rock",
    "Dragonstone",
    "The North",
    "The Riverlands",
    "The Vale",
    "The Westerlands",
    "The Reach",
    "Dorne",
    "The Iron Islands",
    "The Stormlands",
    "Braavos",
    "Volantis",
    "Pentos",
    "Meereen",
    "Astapor",
    "Yunkai",
    "Qarth",
    "Valyria",
];

const TIME_INDICATORS: [&str; 10] = [
    "during",
    "after",
    "before",
    "when",
    "at the time",
    "following",
    "AC",
    "BC",
    "age",
    "year",
];

const REASON_INDICATORS: [&str; 6] = [
    "because",
    "due to",
    "as a result",
    "reason",
    "motivated by",
    "intended to",
];

/// Responses used when a query produced no context at all.
pub const NO_INFO_RESPONSES: [&str; 6] = [
    "I don't have enough information about that in my Game of Thrones knowledge.",
    "That doesn't appear in my records of Westeros and Essos.",
    "The maesters haven't recorded that information in my archives.",
    "I don't know about that aspect of Game of Thrones. Would you like to ask about one of the main characters or houses instead?",
    "My knowledge of the Seven Kingdoms doesn't include that information.",
    "Even the Spider's little birds haven't whispered that to me yet.",
];

/// Picks an index into a slice of `n` candidate responses.
pub type Chooser = Box<dyn Fn(usize) -> usize + Send + Sync>;

/// Derives templated answers from an assembled context.
pub struct RuleBasedAnswerer {
    chooser: Chooser,
}

impl RuleBasedAnswerer {
    /// Answerer with uniformly random no-info selection.
    pub fn new() -> Self {
        Self {
            chooser: Box::new(|n| rand::thread_rng().gen_range(0..n)),
        }
    }

    /// Answerer with an injected selection function, for deterministic
    /// tests.
    pub fn with_chooser(chooser: Chooser) -> Self {
        Self { chooser }
    }

    /// Produce an answer for `query` from `context`. An empty context
    /// yields one of the fixed no-information responses.
    pub fn answer(&self, query: &str, context: &str) -> String {
        if context.is_empty() {
            return self.no_info_response();
        }
        match classify(query) {
            QueryKind::About => about_response(context),
            QueryKind::Location => location_response(context),
            QueryKind::Time => time_response(context),
            QueryKind::Reason => reason_response(context),
            QueryKind::Process => process_response(context),
            QueryKind::General => general_response(query, context),
        }
    }

    /// One of [`NO_INFO_RESPONSES`], chosen by the selection function.
    pub fn no_info_response(&self) -> String {
        let idx = (self.chooser)(NO_INFO_RESPONSES.len()) % NO_INFO_RESPONSES.len();
        NO_INFO_RESPONSES[idx].to_string()
    }
}

impl Default for RuleBasedAnswerer {
    fn default() -> Self {
        Self::new()
    }
}

/// First blank-line-delimited paragraph longer than `min_len`, else the
/// first paragraph overall.
fn substantial_paragraph(context: &str, min_len: usize) -> &str {
    let mut paragraphs = context.split("\n\n");
    let first = paragraphs.next().unwrap_or(context);
    std::iter::once(first)
        .chain(paragraphs)
        .find(|p| p.len() > min_len)
        .unwrap_or(first)
}

/// The title of the first `--- {title} ---` block, or `"unknown"`.
fn first_block_title(context: &str) -> &str {
    let mut sections = context.split("---");
    sections.next();
    sections.next().map(str::trim).unwrap_or("unknown")
}

/// The sentence enclosing byte offset `index`, bounded by the nearest
/// periods on each side.
fn sentence_around(context: &str, index: usize) -> &str {
    let start = context[..index].rfind('.').map(|i| i + 1).unwrap_or(0);
    let end = context[index..]
        .find('.')
        .map(|i| index + i)
        .unwrap_or(context.len());
    context[start..end].trim()
}

fn about_response(context: &str) -> String {
    let entity = first_block_title(context);
    let info = substantial_paragraph(context, 100);
    format!("Based on the Game of Thrones lore about {entity}, {info}")
}

fn location_response(context: &str) -> String {
    let context_lower = context.to_lowercase();
    for location in KNOWN_LOCATIONS {
        if context_lower.contains(&location.to_lowercase()) {
            let para = context
                .split("\n\n")
                .find(|p| p.to_lowercase().contains(&location.to_lowercase()))
                .unwrap_or("is mentioned in the Game of Thrones universe");
            return format!("{location} {para}");
        }
    }
    let first = context.split("\n\n").next().unwrap_or(context);
    format!("Based on the Game of Thrones lore, {first}")
}

fn time_response(context: &str) -> String {
    for indicator in TIME_INDICATORS {
        if let Some(index) = crate::excerpt::find_ignore_ascii_case(context, indicator) {
            let sentence = sentence_around(context, index);
            return format!("According to Game of Thrones history, {sentence}.");
        }
    }
    let first = context.split("\n\n").next().unwrap_or(context);
    format!("Based on Game of Thrones chronology, {first}")
}

fn reason_response(context: &str) -> String {
    for indicator in REASON_INDICATORS {
        if let Some(index) = crate::excerpt::find_ignore_ascii_case(context, indicator) {
            let sentence = sentence_around(context, index);
            return format!("In the Game of Thrones world, {sentence}.");
        }
    }
    let first = context.split("\n\n").next().unwrap_or(context);
    format!("According to Game of Thrones lore, {first}")
}

fn process_response(context: &str) -> String {
    let para = substantial_paragraph(context, 150);
    format!("Here's how it happened in Game of Thrones: {para}")
}

fn general_response(query: &str, context: &str) -> String {
    let query_words: Vec<String> = query
        .split_whitespace()
        .filter(|w| w.len() > 3)
        .map(str::to_lowercase)
        .collect();

    for paragraph in context.split("\n\n") {
        let para_lower = paragraph.to_lowercase();
        if query_words.iter().any(|w| para_lower.contains(w)) {
            return format!("In Game of Thrones: {paragraph}");
        }
    }

    let para = substantial_paragraph(context, 100);
    format!("According to Game of Thrones lore: {para}")
}
