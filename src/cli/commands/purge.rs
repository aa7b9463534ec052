//! Purge command - delete stores from older generations

use crate::cli::args::PurgeArgs;
use crate::error::FrescaResult;
use crate::store::{DiskBackend, StoreBackend};
use crate::version::current_generation;
use console::style;
use std::path::PathBuf;
use tracing::warn;

/// Execute the purge command
pub async fn execute(args: PurgeArgs, store_root: PathBuf) -> FrescaResult<()> {
    let current = current_generation();
    let backend = DiskBackend::new(store_root);

    let stale: Vec<_> = backend
        .generations()
        .await?
        .into_iter()
        .filter(|generation| *generation != current)
        .collect();

    if stale.is_empty() {
        println!("No stale cache stores.");
        return Ok(());
    }

    if args.dry_run {
        println!("Would delete {} store(s):", stale.len());
        for generation in &stale {
            println!("  {}", generation);
        }
        return Ok(());
    }

    let mut deleted = 0usize;
    for generation in &stale {
        match backend.delete(generation).await {
            Ok(true) => {
                println!("  {} {}", style("deleted").green(), generation);
                deleted += 1;
            }
            Ok(false) => {}
            Err(e) => warn!("Could not delete {}: {}", generation, e),
        }
    }

    println!(
        "{} Removed {} of {} stale store(s)",
        style("[OK]").green(),
        deleted,
        stale.len()
    );

    Ok(())
}
