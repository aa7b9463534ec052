//! Generation lifecycle
//!
//! A generation moves through three states:
//!
//! | State | Entered | Meaning |
//! |-------|---------|---------|
//! | Installing | construction | store being seeded from the manifest |
//! | Activating | install succeeded | installed, waiting to take over |
//! | Serving | activation succeeded | authoritative for all consumers |
//!
//! Transitions are guarded: activation while still `Installing` is an
//! error, so a half-initialized generation can never claim consumers. A
//! process restart with a new version marker begins a fresh machine.

use crate::clients::ClientRegistry;
use crate::error::{FrescaError, FrescaResult};
use crate::fetch::Fetcher;
use crate::http::RequestIdentity;
use crate::manifest::Feed;
use crate::store::{CacheStore, StoreBackend};
use crate::version::Generation;
use futures_util::future::try_join_all;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// Lifecycle position of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Seeding the store; not yet eligible to take over
    Installing,
    /// Installed; will take over on the next activation
    Activating,
    /// Authoritative for all consumers
    Serving,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Installing => "installing",
            LifecycleState::Activating => "activating",
            LifecycleState::Serving => "serving",
        };
        f.write_str(name)
    }
}

/// Drives one generation from install through activation to serving.
pub struct LifecycleCoordinator {
    backend: Arc<dyn StoreBackend>,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<ClientRegistry>,
    generation: Generation,
    origin: Url,
    manifest: RequestIdentity,
    state: Mutex<LifecycleState>,
}

impl LifecycleCoordinator {
    /// Create a coordinator in the `Installing` state.
    ///
    /// `origin` must be an absolute base URL; `manifest_path` is resolved
    /// against it to locate the feed document.
    pub fn new(
        backend: Arc<dyn StoreBackend>,
        fetcher: Arc<dyn Fetcher>,
        clients: Arc<ClientRegistry>,
        generation: Generation,
        origin: &str,
        manifest_path: &str,
    ) -> FrescaResult<Self> {
        let origin = Url::parse(origin).map_err(|e| FrescaError::OriginInvalid {
            url: origin.to_string(),
            reason: e.to_string(),
        })?;
        let manifest_url = origin
            .join(manifest_path)
            .map_err(|e| FrescaError::OriginInvalid {
                url: format!("{origin}{manifest_path}"),
                reason: e.to_string(),
            })?;

        Ok(Self {
            backend,
            fetcher,
            clients,
            generation,
            origin,
            manifest: RequestIdentity::get(manifest_url),
            state: Mutex::new(LifecycleState::Installing),
        })
    }

    /// The generation this coordinator manages.
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Current lifecycle state, for diagnostics.
    pub async fn state(&self) -> LifecycleState {
        *self.state.lock().await
    }

    /// Seed the store for this generation from the manifest.
    ///
    /// Opens (creating if absent) the store, fetches and parses the feed,
    /// then prefetches every referenced asset concurrently. All-or-nothing:
    /// any failure fails the install, leaves whatever was already written
    /// in place, and keeps the machine in `Installing`, so activation stays
    /// unreachable.
    pub async fn install(&self) -> FrescaResult<()> {
        let mut state = self.state.lock().await;
        if *state != LifecycleState::Installing {
            return Err(FrescaError::InvalidTransition(format!(
                "install requested while {state}"
            )));
        }

        let store = self
            .backend
            .open(&self.generation)
            .await
            .map_err(|e| self.install_err(e))?;

        debug!("Fetching manifest {}", self.manifest.url);
        let manifest = self
            .fetcher
            .fetch(&self.manifest)
            .await
            .map_err(|e| self.install_err(e))?;
        if !manifest.is_success() {
            return Err(self.install_err(format!(
                "manifest fetch returned status {}",
                manifest.status
            )));
        }

        let feed = Feed::parse(&manifest.body).map_err(|e| self.install_err(e))?;
        let paths = feed.asset_paths().map_err(|e| self.install_err(e))?;
        info!(
            "Installing {}: prefetching {} asset(s)",
            self.generation,
            paths.len()
        );

        let prefetches: Vec<_> = paths
            .iter()
            .map(|path| {
                let identity = self.asset_identity(path)?;
                let fetcher = self.fetcher.clone();
                let store = store.clone();
                Ok(async move {
                    let snapshot = fetcher.fetch(&identity).await?;
                    store.put(&identity, snapshot).await
                })
            })
            .collect::<FrescaResult<_>>()
            .map_err(|e: FrescaError| self.install_err(e))?;

        try_join_all(prefetches)
            .await
            .map_err(|e| self.install_err(e))?;

        *state = LifecycleState::Activating;
        info!("Installed {}", self.generation);
        Ok(())
    }

    /// Take over: prune every non-current store, then claim consumers.
    ///
    /// Deletions are best-effort and independent per store; a failure is
    /// logged and the rest still proceed. The claim only happens after all
    /// deletions have been attempted. Re-activating while `Serving` is
    /// idempotent.
    pub async fn activate(&self) -> FrescaResult<()> {
        let mut state = self.state.lock().await;
        if *state == LifecycleState::Installing {
            return Err(FrescaError::InvalidTransition(
                "activation requested before install completed".to_string(),
            ));
        }

        let stale = match self.backend.generations().await {
            Ok(generations) => generations,
            Err(e) => {
                warn!("Could not enumerate cache stores: {}", e);
                vec![]
            }
        };

        for generation in stale.iter().filter(|g| **g != self.generation) {
            match self.backend.delete(generation).await {
                Ok(true) => info!("Removed stale cache store {}", generation),
                Ok(false) => {}
                Err(e) => warn!("Could not delete stale store {}: {}", generation, e),
            }
        }

        self.clients.claim(self.generation.clone());
        *state = LifecycleState::Serving;
        info!("Generation {} is now serving", self.generation);
        Ok(())
    }

    fn asset_identity(&self, path: &str) -> FrescaResult<RequestIdentity> {
        let url = self
            .origin
            .join(path)
            .map_err(|e| FrescaError::OriginInvalid {
                url: format!("{}{path}", self.origin),
                reason: e.to_string(),
            })?;
        Ok(RequestIdentity::get(url))
    }

    fn install_err(&self, reason: impl ToString) -> FrescaError {
        FrescaError::Install {
            generation: self.generation.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{Script, ScriptedFetcher};
    use crate::store::{MemoryBackend, StoreBackend};
    use async_trait::async_trait;

    const ORIGIN: &str = "https://example.io";
    const MANIFEST: &str = "/feeds/atom.json";

    const FEED: &str = r#"{
        "entry": [
            {"href": "https://example.io/a"},
            {"href": "https://example.io/b"}
        ]
    }"#;

    fn coordinator(
        backend: Arc<dyn StoreBackend>,
        fetcher: ScriptedFetcher,
        clients: Arc<ClientRegistry>,
        marker: &str,
    ) -> LifecycleCoordinator {
        LifecycleCoordinator::new(
            backend,
            Arc::new(fetcher),
            clients,
            Generation::from_marker(marker),
            ORIGIN,
            MANIFEST,
        )
        .unwrap()
    }

    fn seeded_fetcher() -> ScriptedFetcher {
        ScriptedFetcher::new()
            .route("https://example.io/feeds/atom.json", Script::Status(200, FEED))
            .route("https://example.io/a", Script::Ok("A"))
            .route("https://example.io/b", Script::Ok("B"))
    }

    #[tokio::test]
    async fn install_seeds_store_from_manifest() {
        let backend = Arc::new(MemoryBackend::new());
        let coordinator = coordinator(
            backend.clone(),
            seeded_fetcher(),
            Arc::new(ClientRegistry::new()),
            "3.0.0",
        );

        assert_eq!(coordinator.state().await, LifecycleState::Installing);
        coordinator.install().await.unwrap();
        assert_eq!(coordinator.state().await, LifecycleState::Activating);

        let store = backend
            .open(&Generation::from_marker("3.0.0"))
            .await
            .unwrap();
        let a = store
            .lookup(&RequestIdentity::get("https://example.io/a"))
            .await
            .unwrap()
            .unwrap();
        let b = store
            .lookup(&RequestIdentity::get("https://example.io/b"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(a.body_text(), "A");
        assert_eq!(b.body_text(), "B");
    }

    #[tokio::test]
    async fn failed_asset_fetch_fails_install() {
        let backend = Arc::new(MemoryBackend::new());
        let fetcher = ScriptedFetcher::new()
            .route("https://example.io/feeds/atom.json", Script::Status(200, FEED))
            .route("https://example.io/a", Script::Ok("A"));
        // no route for /b: the fetch fails
        let clients = Arc::new(ClientRegistry::new());
        let coordinator = coordinator(backend.clone(), fetcher, clients.clone(), "3.0.0");

        let err = coordinator.install().await.unwrap_err();
        assert!(matches!(err, FrescaError::Install { .. }));
        assert_eq!(coordinator.state().await, LifecycleState::Installing);

        // Install failure blocks activation, so no claim happens
        let err = coordinator.activate().await.unwrap_err();
        assert!(matches!(err, FrescaError::InvalidTransition(_)));
        assert_eq!(clients.controller(), None);
    }

    #[tokio::test]
    async fn non_success_manifest_fails_install() {
        let backend = Arc::new(MemoryBackend::new());
        let fetcher = ScriptedFetcher::new().route(
            "https://example.io/feeds/atom.json",
            Script::Status(503, "unavailable"),
        );
        let coordinator = coordinator(
            backend,
            fetcher,
            Arc::new(ClientRegistry::new()),
            "3.0.0",
        );

        let err = coordinator.install().await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert_eq!(coordinator.state().await, LifecycleState::Installing);
    }

    #[tokio::test]
    async fn activation_prunes_stale_generations_and_claims() {
        let backend = Arc::new(MemoryBackend::new());
        let g1 = Generation::from_marker("1.0.0");
        let g2 = Generation::from_marker("2.0.0");
        let g3 = Generation::from_marker("3.0.0");
        backend.open(&g1).await.unwrap();
        backend.open(&g2).await.unwrap();

        let clients = Arc::new(ClientRegistry::new());
        let coordinator = coordinator(backend.clone(), seeded_fetcher(), clients.clone(), "3.0.0");

        coordinator.install().await.unwrap();
        coordinator.activate().await.unwrap();

        assert_eq!(backend.generations().await.unwrap(), vec![g3.clone()]);
        assert_eq!(clients.controller(), Some(g3));
        assert_eq!(coordinator.state().await, LifecycleState::Serving);
    }

    #[tokio::test]
    async fn activation_is_idempotent() {
        let backend = Arc::new(MemoryBackend::new());
        let clients = Arc::new(ClientRegistry::new());
        let coordinator = coordinator(backend.clone(), seeded_fetcher(), clients.clone(), "3.0.0");

        coordinator.install().await.unwrap();
        coordinator.activate().await.unwrap();
        coordinator.activate().await.unwrap();

        assert_eq!(
            backend.generations().await.unwrap(),
            vec![Generation::from_marker("3.0.0")]
        );
        assert_eq!(coordinator.state().await, LifecycleState::Serving);
    }

    #[tokio::test]
    async fn reinstall_after_success_is_rejected() {
        let backend = Arc::new(MemoryBackend::new());
        let coordinator = coordinator(
            backend,
            seeded_fetcher(),
            Arc::new(ClientRegistry::new()),
            "3.0.0",
        );

        coordinator.install().await.unwrap();
        let err = coordinator.install().await.unwrap_err();
        assert!(matches!(err, FrescaError::InvalidTransition(_)));
    }

    /// Backend whose deletes fail for one generation, to exercise the
    /// best-effort pruning path.
    struct FlakyDeleteBackend {
        inner: MemoryBackend,
        poisoned: Generation,
    }

    #[async_trait]
    impl StoreBackend for FlakyDeleteBackend {
        async fn open(
            &self,
            generation: &Generation,
        ) -> FrescaResult<Arc<dyn crate::store::CacheStore>> {
            self.inner.open(generation).await
        }

        async fn generations(&self) -> FrescaResult<Vec<Generation>> {
            self.inner.generations().await
        }

        async fn delete(&self, generation: &Generation) -> FrescaResult<bool> {
            if *generation == self.poisoned {
                return Err(FrescaError::io(
                    "deleting poisoned store",
                    std::io::Error::other("device busy"),
                ));
            }
            self.inner.delete(generation).await
        }
    }

    #[tokio::test]
    async fn delete_failure_does_not_block_claim() {
        let g1 = Generation::from_marker("1.0.0");
        let g2 = Generation::from_marker("2.0.0");
        let backend = Arc::new(FlakyDeleteBackend {
            inner: MemoryBackend::new(),
            poisoned: g1.clone(),
        });
        backend.inner.open(&g1).await.unwrap();
        backend.inner.open(&g2).await.unwrap();

        let clients = Arc::new(ClientRegistry::new());
        let coordinator = coordinator(backend.clone(), seeded_fetcher(), clients.clone(), "3.0.0");

        coordinator.install().await.unwrap();
        coordinator.activate().await.unwrap();

        // g1 survived its failed delete, g2 went away, the claim still ran
        let left = backend.generations().await.unwrap();
        assert!(left.contains(&g1));
        assert!(!left.contains(&g2));
        assert_eq!(clients.controller(), Some(Generation::from_marker("3.0.0")));
    }
}
