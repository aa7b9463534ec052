//! Request interception and the lookup/fetch race
//!
//! Every request a controlled consumer issues is offered to
//! [`InterceptEngine::handle`]. Requests for the agent's own bootstrap path
//! pass through untouched; everything else races a cache lookup against a
//! live fetch and resolves to whichever settles first.
//!
//! The race has three deliberate properties:
//!
//! - A miss never settles the cached branch. Only a found snapshot can win;
//!   an absent entry leaves the network branch to decide the outcome.
//! - The cached branch is polled first, so a found snapshot wins ties.
//! - The losing fetch is never cancelled. It runs in a supervised
//!   background task whose result refreshes the store, so a cache hit is
//!   always followed by a revalidation attempt.

use crate::error::{FrescaError, FrescaResult};
use crate::fetch::Fetcher;
use crate::http::{InterceptedRequest, ResponseSnapshot};
use crate::store::{CacheStore, StoreBackend};
use crate::tasks::BackgroundTasks;
use crate::version::Generation;
use futures_util::future::{select, Either};
use std::pin::pin;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// The engine's answer to an offered request.
#[derive(Debug)]
pub enum Disposition {
    /// The engine produced a response (cached or live)
    Intercepted(ResponseSnapshot),
    /// The request is not the engine's business; let it through unmodified
    NotIntercepted,
}

impl Disposition {
    /// The snapshot, if the request was intercepted.
    pub fn into_snapshot(self) -> Option<ResponseSnapshot> {
        match self {
            Disposition::Intercepted(snapshot) => Some(snapshot),
            Disposition::NotIntercepted => None,
        }
    }
}

/// Per-request interception engine for one generation's store.
pub struct InterceptEngine {
    backend: Arc<dyn StoreBackend>,
    fetcher: Arc<dyn Fetcher>,
    generation: Generation,
    bootstrap_path: String,
    tasks: BackgroundTasks,
}

impl InterceptEngine {
    /// Create an engine addressing `generation`'s store.
    ///
    /// `bootstrap_path` is the path the agent itself is registered under;
    /// requests for it are never intercepted.
    pub fn new(
        backend: Arc<dyn StoreBackend>,
        fetcher: Arc<dyn Fetcher>,
        generation: Generation,
        bootstrap_path: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            fetcher,
            generation,
            bootstrap_path: bootstrap_path.into(),
            tasks: BackgroundTasks::new(),
        }
    }

    /// The generation whose store this engine addresses.
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Offer a request to the engine.
    ///
    /// Returns [`Disposition::NotIntercepted`] for the bootstrap path. For
    /// everything else, resolves to the first settled of a cache lookup and
    /// a live fetch; the fetch result refreshes the store in the background
    /// regardless of which branch won. A fetch failure only surfaces when
    /// there was no stored response to fall back on.
    pub async fn handle(&self, request: &InterceptedRequest) -> FrescaResult<Disposition> {
        let identity = &request.identity;

        if identity.path().as_deref() == Some(self.bootstrap_path.as_str()) {
            debug!("Bypassing own bootstrap resource: {}", identity);
            return Ok(Disposition::NotIntercepted);
        }

        debug!(
            "Intercepting {} (destination {:?})",
            identity, request.destination
        );

        // Store bookkeeping never fails the request: an unopenable store
        // degrades to network-only behavior.
        let store: Option<Arc<dyn CacheStore>> = match self.backend.open(&self.generation).await {
            Ok(store) => Some(store),
            Err(e) => {
                warn!("Could not open store for {}: {}", self.generation, e);
                None
            }
        };

        let cached = match &store {
            Some(store) => match store.lookup(identity).await {
                Ok(found) => found,
                Err(e) => {
                    warn!("Lookup failed for {}: {}", identity, e);
                    None
                }
            },
            None => None,
        };

        // The fetch lives in a supervised task that owns the write-back, so
        // losing the race never cancels it.
        let (network_tx, network_rx) = oneshot::channel();
        {
            let fetcher = self.fetcher.clone();
            let identity = identity.clone();
            let store = store.clone();
            self.tasks
                .spawn(async move {
                    let result = fetcher.fetch(&identity).await;
                    let snapshot = result.as_ref().ok().cloned();

                    // Report to the race before touching the store; the
                    // race may already be decided, so an unreceived result
                    // is fine.
                    let _ = network_tx.send(result);

                    if let (Some(snapshot), Some(store)) = (snapshot, store) {
                        if let Err(e) = store.put(&identity, snapshot).await {
                            warn!("Write-back failed for {}: {}", identity, e);
                        }
                    }
                })
                .await;
        }

        // Branch (a): settles immediately iff a snapshot was found. A miss
        // never settles, so the network branch decides by default.
        let cached_branch = pin!(async {
            match cached {
                Some(snapshot) => snapshot,
                None => std::future::pending().await,
            }
        });

        match select(cached_branch, network_rx).await {
            Either::Left((snapshot, _)) => {
                debug!("Cache hit for {}", identity);
                Ok(Disposition::Intercepted(snapshot))
            }
            Either::Right((network, _)) => match network {
                Ok(Ok(snapshot)) => {
                    debug!("Network response for {}", identity);
                    Ok(Disposition::Intercepted(snapshot))
                }
                Ok(Err(e)) => Err(e),
                // Fetch task died before reporting; nothing to serve.
                Err(_) => Err(FrescaError::fetch(&identity.url, "fetch task dropped")),
            },
        }
    }

    /// Wait for all pending write-backs to finish.
    pub async fn quiesce(&self) {
        self.tasks.quiesce().await;
    }
}
