//! Show command - inspect one stored response

use crate::cli::args::ShowArgs;
use crate::config::Config;
use crate::error::{FrescaError, FrescaResult};
use crate::http::RequestIdentity;
use crate::store::{CacheStore, DiskBackend, StoreBackend};
use crate::version::{current_generation, Generation};
use console::style;
use std::io::{self, Write};
use std::path::PathBuf;
use url::Url;

/// Execute the show command
pub async fn execute(args: ShowArgs, config: &Config, store_root: PathBuf) -> FrescaResult<()> {
    let generation = match &args.generation {
        Some(name) => Generation::from_name(name)
            .ok_or_else(|| FrescaError::UnknownGeneration(name.clone()))?,
        None => current_generation(),
    };

    let backend = DiskBackend::new(store_root);
    if !backend.generations().await?.contains(&generation) {
        return Err(FrescaError::UnknownGeneration(generation.to_string()));
    }

    let origin = Url::parse(&config.agent.origin).map_err(|e| FrescaError::OriginInvalid {
        url: config.agent.origin.clone(),
        reason: e.to_string(),
    })?;
    let url = origin.join(&args.path).map_err(|e| FrescaError::OriginInvalid {
        url: format!("{origin}{}", args.path),
        reason: e.to_string(),
    })?;
    let identity = RequestIdentity::get(url);

    let store = backend.open(&generation).await?;
    let snapshot = store
        .lookup(&identity)
        .await?
        .ok_or_else(|| FrescaError::EntryNotFound(identity.to_string()))?;

    if args.body {
        io::stdout()
            .write_all(&snapshot.body)
            .map_err(|e| FrescaError::io("writing body to stdout", e))?;
        return Ok(());
    }

    println!("{} {}", style("URL:").bold(), snapshot.url);
    println!("{} {}", style("Status:").bold(), snapshot.status);
    println!("{} {}", style("Fetched:").bold(), snapshot.fetched_at);
    println!("{} {} bytes", style("Body:").bold(), snapshot.body.len());

    if !snapshot.headers.is_empty() {
        println!();
        println!("{}", style("Headers:").bold());
        for (name, value) in &snapshot.headers {
            println!("  {}: {}", name, value);
        }
    }

    Ok(())
}
