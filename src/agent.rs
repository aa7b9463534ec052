//! Composition root
//!
//! Wires the version registry, lifecycle coordinator, interception engine
//! and client registry into one agent for the current generation. This is
//! the surface a hosting runtime drives: `install`, `activate`,
//! `intercept`, plus the state it may query back.

use crate::clients::ClientRegistry;
use crate::config::Config;
use crate::engine::{Disposition, InterceptEngine};
use crate::error::FrescaResult;
use crate::fetch::Fetcher;
use crate::http::InterceptedRequest;
use crate::lifecycle::{LifecycleCoordinator, LifecycleState};
use crate::store::StoreBackend;
use crate::version::{current_generation, Generation};
use std::sync::Arc;

/// A caching agent for one generation.
pub struct CacheAgent {
    generation: Generation,
    clients: Arc<ClientRegistry>,
    coordinator: LifecycleCoordinator,
    engine: InterceptEngine,
}

impl CacheAgent {
    /// Assemble an agent for the running binary's generation.
    ///
    /// The backend and fetcher are injected so embedders control storage
    /// and transport; the generation always comes from the version
    /// registry.
    pub fn new(
        backend: Arc<dyn StoreBackend>,
        fetcher: Arc<dyn Fetcher>,
        config: &Config,
    ) -> FrescaResult<Self> {
        Self::for_generation(backend, fetcher, config, current_generation())
    }

    /// Assemble an agent for an explicit generation (diagnostics, tests).
    pub fn for_generation(
        backend: Arc<dyn StoreBackend>,
        fetcher: Arc<dyn Fetcher>,
        config: &Config,
        generation: Generation,
    ) -> FrescaResult<Self> {
        let clients = Arc::new(ClientRegistry::new());
        let coordinator = LifecycleCoordinator::new(
            backend.clone(),
            fetcher.clone(),
            clients.clone(),
            generation.clone(),
            &config.agent.origin,
            &config.agent.manifest_path,
        )?;
        let engine = InterceptEngine::new(
            backend,
            fetcher,
            generation.clone(),
            config.agent.bootstrap_path.clone(),
        );

        Ok(Self {
            generation,
            clients,
            coordinator,
            engine,
        })
    }

    /// The generation this agent serves.
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Host signal: install this generation (manifest prefetch).
    pub async fn install(&self) -> FrescaResult<()> {
        self.coordinator.install().await
    }

    /// Host signal: activate this generation (prune stale stores, claim
    /// consumers).
    pub async fn activate(&self) -> FrescaResult<()> {
        self.coordinator.activate().await
    }

    /// Host signal: a controlled consumer issued a request.
    pub async fn intercept(&self, request: &InterceptedRequest) -> FrescaResult<Disposition> {
        self.engine.handle(request).await
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> LifecycleState {
        self.coordinator.state().await
    }

    /// The generation controlling consumers, if a handoff completed.
    pub fn controller(&self) -> Option<Generation> {
        self.clients.controller()
    }

    /// The consumer registry, for the hosting runtime to connect and
    /// disconnect consumers and to observe handoffs.
    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }

    /// Wait for pending write-backs (graceful shutdown, tests).
    pub async fn quiesce(&self) {
        self.engine.quiesce().await;
    }
}
