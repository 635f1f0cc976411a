//! The `lore stats` command.
//!
//! Prints store size, the derived entity index counts, and a random
//! sample of stored titles.

use anyhow::Result;

use lorekeeper_core::store::DocumentStore;

use crate::config::Config;
use crate::db;
use crate::entities::EntityIndex;
use crate::sqlite_store::SqliteStore;

pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let count = store.count().await?;
    let entities = EntityIndex::build(&store).await?;

    println!("documents: {count}");
    println!("characters: {}", entities.characters.len());
    println!("houses: {}", entities.houses.len());
    println!("locations: {}", entities.locations.len());

    if count == 0 {
        println!();
        println!("The store is empty. Run `lore import <path>` to populate it.");
    } else {
        let sampled = store.sample(5).await?;
        println!();
        println!("sample titles:");
        for doc in &sampled {
            println!("  - {}", doc.title);
        }
    }

    store.pool().close().await;
    Ok(())
}
