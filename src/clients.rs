//! Consumer registry and controller handoff
//!
//! The hosting runtime registers each active consumer here. Claiming makes
//! a generation the controller for every current and future consumer; the
//! handoff is published through a watch channel, so a consumer either
//! observes the discrete "now controlled by generation G" event or, if it
//! connects later, sees the controller immediately in the channel's value.

use crate::version::Generation;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::RwLock;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

/// Identity of one registered consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Registry of active consumers and the generation controlling them.
pub struct ClientRegistry {
    connected: RwLock<HashSet<ClientId>>,
    controller: watch::Sender<Option<Generation>>,
}

impl ClientRegistry {
    /// Create a registry with no consumers and no controller.
    pub fn new() -> Self {
        let (controller, _) = watch::channel(None);
        Self {
            connected: RwLock::new(HashSet::new()),
            controller,
        }
    }

    /// Register a newly connected consumer.
    pub fn connect(&self) -> ClientId {
        let id = ClientId::new();
        self.connected
            .write()
            .expect("client registry poisoned")
            .insert(id);
        debug!("Client connected: {}", id);
        id
    }

    /// Remove a consumer. Returns `false` if it was not registered.
    pub fn disconnect(&self, id: ClientId) -> bool {
        let removed = self
            .connected
            .write()
            .expect("client registry poisoned")
            .remove(&id);
        if removed {
            debug!("Client disconnected: {}", id);
        }
        removed
    }

    /// Currently connected consumers.
    pub fn connected(&self) -> Vec<ClientId> {
        self.connected
            .read()
            .expect("client registry poisoned")
            .iter()
            .copied()
            .collect()
    }

    /// Number of connected consumers.
    pub fn count(&self) -> usize {
        self.connected
            .read()
            .expect("client registry poisoned")
            .len()
    }

    /// Make `generation` the controller for all current and future
    /// consumers. Re-claiming the same generation does not re-notify.
    pub fn claim(&self, generation: Generation) {
        let changed = self.controller.send_if_modified(|current| {
            if current.as_ref() == Some(&generation) {
                return false;
            }
            *current = Some(generation.clone());
            true
        });
        if changed {
            info!(
                "Generation {} claimed {} client(s)",
                generation,
                self.count()
            );
        }
    }

    /// The generation currently controlling consumers, if any.
    pub fn controller(&self) -> Option<Generation> {
        self.controller.borrow().clone()
    }

    /// Subscribe to controller changes. The receiver's current value is the
    /// present controller, so late subscribers observe a completed handoff.
    pub fn subscribe(&self) -> watch::Receiver<Option<Generation>> {
        self.controller.subscribe()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
