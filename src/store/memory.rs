//! In-memory cache stores
//!
//! Process-local backend with the same semantics as the disk backend.
//! Used by the test suite and by embedders that want interception without
//! persistence.

use crate::error::FrescaResult;
use crate::http::{CacheEntry, RequestIdentity, ResponseSnapshot};
use crate::store::{CacheStore, StoreBackend};
use crate::version::Generation;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-process store backend.
#[derive(Default)]
pub struct MemoryBackend {
    stores: RwLock<HashMap<Generation, Arc<MemoryStore>>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn open(&self, generation: &Generation) -> FrescaResult<Arc<dyn CacheStore>> {
        let mut stores = self.stores.write().expect("store registry poisoned");
        let store = stores
            .entry(generation.clone())
            .or_insert_with(|| Arc::new(MemoryStore::default()))
            .clone();
        Ok(store)
    }

    async fn generations(&self) -> FrescaResult<Vec<Generation>> {
        let stores = self.stores.read().expect("store registry poisoned");
        let mut found: Vec<Generation> = stores.keys().cloned().collect();
        found.sort();
        Ok(found)
    }

    async fn delete(&self, generation: &Generation) -> FrescaResult<bool> {
        let mut stores = self.stores.write().expect("store registry poisoned");
        Ok(stores.remove(generation).is_some())
    }
}

/// One generation's in-memory store.
#[derive(Default)]
struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn lookup(&self, identity: &RequestIdentity) -> FrescaResult<Option<ResponseSnapshot>> {
        let entries = self.entries.read().expect("store poisoned");
        Ok(entries
            .get(&identity.cache_key())
            .map(|entry| entry.snapshot.clone()))
    }

    async fn put(
        &self,
        identity: &RequestIdentity,
        snapshot: ResponseSnapshot,
    ) -> FrescaResult<()> {
        let mut entries = self.entries.write().expect("store poisoned");
        entries.insert(
            identity.cache_key(),
            CacheEntry {
                identity: identity.clone(),
                snapshot,
            },
        );
        Ok(())
    }

    async fn entries(&self) -> FrescaResult<Vec<CacheEntry>> {
        let entries = self.entries.read().expect("store poisoned");
        let mut found: Vec<CacheEntry> = entries.values().cloned().collect();
        found.sort_by(|a, b| a.identity.cache_key().cmp(&b.identity.cache_key()));
        Ok(found)
    }
}
