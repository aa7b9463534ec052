//! List command - enumerate cache generations

use crate::cli::args::{ListArgs, OutputFormat};
use crate::error::FrescaResult;
use crate::store::{CacheStore, DiskBackend, StoreBackend};
use crate::version::{current_generation, Generation};
use console::style;
use std::path::PathBuf;

struct GenerationRow {
    generation: Generation,
    entries: usize,
    current: bool,
}

/// Execute the list command
pub async fn execute(args: ListArgs, store_root: PathBuf) -> FrescaResult<()> {
    let backend = DiskBackend::new(store_root);
    let current = current_generation();

    let mut rows = vec![];
    for generation in backend.generations().await? {
        let store = backend.open(&generation).await?;
        let entries = store.len().await?;
        rows.push(GenerationRow {
            current: generation == current,
            generation,
            entries,
        });
    }

    if rows.is_empty() {
        println!("No cache stores found.");
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Plain => print_plain(&rows),
    }

    Ok(())
}

fn print_table(rows: &[GenerationRow]) {
    println!("{:<30} {:>8} {:<10}", "GENERATION", "ENTRIES", "STATUS");
    println!("{}", "-".repeat(50));

    for row in rows {
        let status = if row.current {
            style("current").green().to_string()
        } else {
            style("stale").yellow().to_string()
        };
        println!(
            "{:<30} {:>8} {:<10}",
            row.generation.as_str(),
            row.entries,
            status
        );
    }
}

fn print_json(rows: &[GenerationRow]) -> FrescaResult<()> {
    let doc: Vec<_> = rows
        .iter()
        .map(|row| {
            serde_json::json!({
                "generation": row.generation.as_str(),
                "entries": row.entries,
                "current": row.current,
            })
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&doc).expect("listing serializes")
    );
    Ok(())
}

fn print_plain(rows: &[GenerationRow]) {
    for row in rows {
        println!("{}", row.generation);
    }
}
