//! Install command - seed the current generation's store

use crate::cli::args::InstallArgs;
use crate::clients::ClientRegistry;
use crate::config::Config;
use crate::error::FrescaResult;
use crate::fetch::HttpFetcher;
use crate::lifecycle::LifecycleCoordinator;
use crate::store::{CacheStore, DiskBackend, StoreBackend};
use crate::ui::{PrefetchProgress, UiContext};
use crate::version::current_generation;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config, store_root: PathBuf) -> FrescaResult<()> {
    let generation = current_generation();
    let origin = args.origin.as_deref().unwrap_or(&config.agent.origin);
    debug!("Installing {} from {}", generation, origin);

    let backend = Arc::new(DiskBackend::new(store_root));
    let coordinator = LifecycleCoordinator::new(
        backend.clone(),
        Arc::new(HttpFetcher::new()),
        Arc::new(ClientRegistry::new()),
        generation.clone(),
        origin,
        &config.agent.manifest_path,
    )?;

    let ctx = UiContext::detect();
    let progress = PrefetchProgress::new(&ctx, generation.as_str());
    progress.message(&format!("from {origin}"));

    let outcome = coordinator.install().await;
    progress.finish();
    outcome?;

    let store = backend.open(&generation).await?;
    println!(
        "{} Installed {} ({} entries)",
        style("[OK]").green(),
        generation,
        store.len().await?
    );
    println!("Stale generations can now be removed with: fresca purge");

    Ok(())
}
