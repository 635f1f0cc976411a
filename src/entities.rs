//! Derived entity index over the document store.
//!
//! Classifies stored titles into characters, houses, and locations.
//! Computed once from the store contents at startup and rebuilt when an
//! import completes — never queried ad hoc per request.

use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

use lorekeeper_core::answer::KNOWN_LOCATIONS;
use lorekeeper_core::store::DocumentStore;

fn character_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[A-Z][a-z]+ (Stark|Lannister|Targaryen|Baratheon|Greyjoy|Tully|Tyrell|Martell|Snow)$",
        )
        .expect("valid regex")
    })
}

/// Read-only classification of stored titles.
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    pub characters: Vec<String>,
    pub houses: Vec<String>,
    pub locations: Vec<String>,
}

impl EntityIndex {
    /// Build the index from every title currently in the store.
    pub async fn build(store: &dyn DocumentStore) -> Result<Self> {
        let titles = store.all_titles().await?;

        let mut index = EntityIndex::default();
        for title in titles {
            if character_title_re().is_match(&title) {
                index.characters.push(title);
            } else if title.starts_with("House ") {
                index.houses.push(title);
            } else if KNOWN_LOCATIONS.contains(&title.as_str()) {
                index.locations.push(title);
            }
        }
        Ok(index)
    }
}
