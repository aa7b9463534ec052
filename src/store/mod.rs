//! Generation-scoped cache stores
//!
//! A store is a named key→response mapping, one instance per cache
//! generation. Handles are explicit: both the lifecycle coordinator and the
//! interception engine receive a [`StoreBackend`] and address stores by
//! [`Generation`], so per-generation isolation is an enforceable invariant
//! rather than an ambient global namespace.
//!
//! Two backends ship with the crate:
//!
//! | Backend | Persistence | Use |
//! |---------|-------------|-----|
//! | [`DiskBackend`] | JSON files under a root directory | production |
//! | [`MemoryBackend`] | process-local map | tests, embedders |

pub mod disk;
pub mod memory;

pub use disk::DiskBackend;
pub use memory::MemoryBackend;

use crate::error::FrescaResult;
use crate::http::{CacheEntry, RequestIdentity, ResponseSnapshot};
use crate::version::Generation;
use async_trait::async_trait;
use std::sync::Arc;

/// Registry of cache stores, addressed by generation.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Open the store for `generation`, creating it if absent.
    async fn open(&self, generation: &Generation) -> FrescaResult<Arc<dyn CacheStore>>;

    /// Enumerate the generations that currently have a store.
    async fn generations(&self) -> FrescaResult<Vec<Generation>>;

    /// Delete the store for `generation`.
    ///
    /// Returns `true` if a store existed. Deleting an absent store is not
    /// an error, so activation can re-run safely.
    async fn delete(&self, generation: &Generation) -> FrescaResult<bool>;
}

/// One generation's key→response mapping.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// The stored snapshot for `identity`, if any.
    async fn lookup(&self, identity: &RequestIdentity) -> FrescaResult<Option<ResponseSnapshot>>;

    /// Store or overwrite the snapshot for `identity`.
    async fn put(&self, identity: &RequestIdentity, snapshot: ResponseSnapshot)
        -> FrescaResult<()>;

    /// All entries in the store, for diagnostics.
    async fn entries(&self) -> FrescaResult<Vec<CacheEntry>>;

    /// Number of entries in the store.
    async fn len(&self) -> FrescaResult<usize> {
        Ok(self.entries().await?.len())
    }
}
