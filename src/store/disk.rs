//! Disk-backed cache stores
//!
//! Layout: one subdirectory per generation under the backend root, one JSON
//! file per entry. Entry files are named by the SHA-256 hex digest of the
//! cache key, so arbitrary URLs never leak into filesystem names.
//!
//! Corrupt entry files are treated as absent on lookup and skipped during
//! enumeration; a cache can always be repopulated from the network.

use crate::error::{FrescaError, FrescaResult};
use crate::http::{CacheEntry, RequestIdentity, ResponseSnapshot};
use crate::store::{CacheStore, StoreBackend};
use crate::version::Generation;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Persistent store backend rooted at a directory.
#[derive(Debug, Clone)]
pub struct DiskBackend {
    root: PathBuf,
}

impl DiskBackend {
    /// Create a backend over `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The backend's root directory.
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn generation_dir(&self, generation: &Generation) -> PathBuf {
        self.root.join(generation.as_str())
    }
}

#[async_trait]
impl StoreBackend for DiskBackend {
    async fn open(&self, generation: &Generation) -> FrescaResult<Arc<dyn CacheStore>> {
        let dir = self.generation_dir(generation);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| FrescaError::io(format!("creating store {}", dir.display()), e))?;
        Ok(Arc::new(DiskStore { dir }))
    }

    async fn generations(&self) -> FrescaResult<Vec<Generation>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut found = vec![];
        let mut entries = fs::read_dir(&self.root).await.map_err(|e| {
            FrescaError::io(format!("reading store root {}", self.root.display()), e)
        })?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FrescaError::io("reading store root entry", e))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            match Generation::from_name(name) {
                Some(generation) => found.push(generation),
                None => debug!("Ignoring foreign directory in store root: {}", name),
            }
        }

        found.sort();
        Ok(found)
    }

    async fn delete(&self, generation: &Generation) -> FrescaResult<bool> {
        let dir = self.generation_dir(generation);
        if !dir.exists() {
            return Ok(false);
        }

        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| FrescaError::io(format!("deleting store {}", dir.display()), e))?;
        debug!("Deleted cache store {}", generation);
        Ok(true)
    }
}

/// One generation's on-disk store.
struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    fn entry_path(&self, identity: &RequestIdentity) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(identity.cache_key().as_bytes());
        let digest = hex::encode(hasher.finalize());
        self.dir.join(format!("{digest}.json"))
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn lookup(&self, identity: &RequestIdentity) -> FrescaResult<Option<ResponseSnapshot>> {
        let path = self.entry_path(identity);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read(&path)
            .await
            .map_err(|e| FrescaError::io(format!("reading entry {}", path.display()), e))?;

        match serde_json::from_slice::<CacheEntry>(&content) {
            Ok(entry) => Ok(Some(entry.snapshot)),
            Err(e) => {
                debug!("Discarding corrupt entry {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    async fn put(
        &self,
        identity: &RequestIdentity,
        snapshot: ResponseSnapshot,
    ) -> FrescaResult<()> {
        let path = self.entry_path(identity);
        let entry = CacheEntry {
            identity: identity.clone(),
            snapshot,
        };
        let content = serde_json::to_vec(&entry).map_err(|e| FrescaError::EntryEncode {
            key: identity.cache_key(),
            source: e,
        })?;

        fs::write(&path, content)
            .await
            .map_err(|e| FrescaError::io(format!("writing entry {}", path.display()), e))?;
        Ok(())
    }

    async fn entries(&self) -> FrescaResult<Vec<CacheEntry>> {
        let mut found = vec![];
        let mut dir = fs::read_dir(&self.dir).await.map_err(|e| {
            FrescaError::io(format!("reading store {}", self.dir.display()), e)
        })?;

        while let Some(file) = dir
            .next_entry()
            .await
            .map_err(|e| FrescaError::io("reading store entry", e))?
        {
            let path = file.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let Ok(content) = fs::read(&path).await else {
                continue;
            };
            match serde_json::from_slice::<CacheEntry>(&content) {
                Ok(entry) => found.push(entry),
                Err(e) => debug!("Skipping corrupt entry {}: {}", path.display(), e),
            }
        }

        found.sort_by(|a, b| a.identity.cache_key().cmp(&b.identity.cache_key()));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot(url: &str, body: &str) -> ResponseSnapshot {
        ResponseSnapshot::new(url, 200, vec![], body.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn put_lookup_roundtrip() {
        let temp = TempDir::new().unwrap();
        let backend = DiskBackend::new(temp.path());
        let generation = Generation::from_marker("1.0.0");

        let store = backend.open(&generation).await.unwrap();
        let identity = RequestIdentity::get("https://example.io/a");

        assert_eq!(store.lookup(&identity).await.unwrap(), None);

        store
            .put(&identity, snapshot("https://example.io/a", "A"))
            .await
            .unwrap();

        let found = store.lookup(&identity).await.unwrap().unwrap();
        assert_eq!(found.body_text(), "A");
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn overwrite_replaces_entry() {
        let temp = TempDir::new().unwrap();
        let backend = DiskBackend::new(temp.path());
        let store = backend
            .open(&Generation::from_marker("1.0.0"))
            .await
            .unwrap();
        let identity = RequestIdentity::get("https://example.io/a");

        store
            .put(&identity, snapshot("https://example.io/a", "A"))
            .await
            .unwrap();
        store
            .put(&identity, snapshot("https://example.io/a", "A2"))
            .await
            .unwrap();

        let found = store.lookup(&identity).await.unwrap().unwrap();
        assert_eq!(found.body_text(), "A2");
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn enumerate_and_delete_generations() {
        let temp = TempDir::new().unwrap();
        let backend = DiskBackend::new(temp.path());
        let g1 = Generation::from_marker("1.0.0");
        let g2 = Generation::from_marker("2.0.0");

        backend.open(&g1).await.unwrap();
        backend.open(&g2).await.unwrap();
        assert_eq!(
            backend.generations().await.unwrap(),
            vec![g1.clone(), g2.clone()]
        );

        assert!(backend.delete(&g1).await.unwrap());
        assert!(!backend.delete(&g1).await.unwrap());
        assert_eq!(backend.generations().await.unwrap(), vec![g2]);
    }

    #[tokio::test]
    async fn foreign_directories_ignored() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("not-a-generation")).unwrap();
        let backend = DiskBackend::new(temp.path());

        assert!(backend.generations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let backend = DiskBackend::new(temp.path());
        let generation = Generation::from_marker("1.0.0");
        let store = backend.open(&generation).await.unwrap();
        let identity = RequestIdentity::get("https://example.io/a");

        store
            .put(&identity, snapshot("https://example.io/a", "A"))
            .await
            .unwrap();

        // Clobber the entry file on disk
        let dir = temp.path().join(generation.as_str());
        for file in std::fs::read_dir(dir).unwrap() {
            std::fs::write(file.unwrap().path(), b"{ truncated").unwrap();
        }

        assert_eq!(store.lookup(&identity).await.unwrap(), None);
        assert!(store.entries().await.unwrap().is_empty());
    }
}
