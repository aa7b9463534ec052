//! Status command - current generation and store summary

use crate::error::FrescaResult;
use crate::store::{CacheStore, DiskBackend, StoreBackend};
use crate::version::current_generation;
use console::style;
use std::path::PathBuf;

/// Execute the status command
pub async fn execute(store_root: PathBuf) -> FrescaResult<()> {
    let generation = current_generation();
    let backend = DiskBackend::new(store_root);

    println!("{} {}", style("Generation:").bold(), generation);
    println!(
        "{} {}",
        style("Store root:").bold(),
        backend.root().display()
    );
    println!();

    let generations = backend.generations().await?;
    if generations.is_empty() {
        println!("No cache stores found. Run: fresca install");
        return Ok(());
    }

    for found in &generations {
        let store = backend.open(found).await?;
        let entries = store.len().await?;
        let marker = if *found == generation {
            style(" (current)").green().to_string()
        } else {
            style(" (stale)").yellow().to_string()
        };
        println!("  {}  {} entries{}", found, entries, marker);
    }

    if generations.iter().all(|found| *found != generation) {
        println!();
        println!(
            "The current generation has no store yet. Run: {}",
            style("fresca install").bold()
        );
    }

    Ok(())
}
